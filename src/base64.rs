use thiserror::Error;

/// 錯誤類型，用於描述 base64url 編碼與解碼過程中的各種錯誤情形。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// 當遇到無效字符時返回此錯誤，包含該無效字符的 ASCII 值。
    #[error("Invalid character: {0}")]
    InvalidCharacter(u8),

    /// 當字符串長度無效時返回此錯誤（長度除以 4 餘 1 的字符串不可能是合法編碼）。
    #[error("Invalid length")]
    InvalidLength,
}

/// 提供 URL 安全且無填充的 Base64 編碼與解碼功能的結構體。
///
/// ACME 協議（RFC 8555）規定 JWS 的各個片段必須使用 RFC 7515 定義的
/// base64url 編碼：字符集以 `-` 與 `_` 取代 `+` 與 `/`，且不得帶有 `=` 填充。
/// 此結構體內部僅保存符合該格式的字符串。
///
/// # 示例
///
/// ```
/// # use racme_account::base64::Base64Url;
/// let b64 = Base64Url::encode("Hello, World!");
/// assert_eq!(b64.as_str(), "SGVsbG8sIFdvcmxkIQ");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64Url {
    encoded: String,
}

impl Base64Url {
    // URL 安全字符映射表，最後兩個字符與標準 Base64 不同。
    const ALPHABET: &'static [u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

    /// 根據輸入數據生成 base64url 編碼。
    ///
    /// 該函數接受任何可轉換為字節切片的類型（例如 `&str` 或 `Vec<u8>`），
    /// 編碼結果不含任何 `=` 填充字符。
    pub fn encode<T: AsRef<[u8]>>(input: T) -> Self {
        let bytes = input.as_ref();
        let mut output = Vec::with_capacity((bytes.len() + 2) / 3 * 4);

        for chunk in bytes.chunks(3) {
            let b1 = chunk[0];
            let b2 = chunk.get(1).copied().unwrap_or(0);
            let b3 = chunk.get(2).copied().unwrap_or(0);

            output.push(Self::ALPHABET[(b1 >> 2) as usize]);
            output.push(Self::ALPHABET[((b1 & 0x03) << 4 | (b2 >> 4)) as usize]);

            if chunk.len() > 1 {
                output.push(Self::ALPHABET[((b2 & 0x0F) << 2 | (b3 >> 6)) as usize]);
            }
            if chunk.len() > 2 {
                output.push(Self::ALPHABET[(b3 & 0x3F) as usize]);
            }
        }

        let encoded = String::from_utf8(output).expect("Invalid UTF-8 sequence");
        Self { encoded }
    }

    /// 根據已編碼的 base64url 字符串生成 `Base64Url` 實例，並進行基礎驗證。
    ///
    /// # 錯誤
    ///
    /// 可能返回 [`DecodeError::InvalidLength`] 或 [`DecodeError::InvalidCharacter`]。
    pub fn from_encoded(encoded: &str) -> Result<Self, DecodeError> {
        if encoded.len() % 4 == 1 {
            return Err(DecodeError::InvalidLength);
        }
        if let Some(c) = encoded.bytes().find(|&c| !is_valid_char(c)) {
            return Err(DecodeError::InvalidCharacter(c));
        }

        Ok(Self {
            encoded: encoded.to_string(),
        })
    }

    /// 將當前編碼的數據解碼為原始二進制數據。
    ///
    /// # 錯誤
    ///
    /// 可能返回 [`DecodeError::InvalidCharacter`] 或 [`DecodeError::InvalidLength`]。
    pub fn decode(&self) -> Result<Vec<u8>, DecodeError> {
        let encoded = self.encoded.as_bytes();
        if encoded.len() % 4 == 1 {
            return Err(DecodeError::InvalidLength);
        }

        let mut buffer = Vec::with_capacity(encoded.len() / 4 * 3 + 2);

        for chunk in encoded.chunks(4) {
            let c1 = decode_char(chunk[0])?;
            let c2 = decode_char(chunk[1])?;
            buffer.push(c1 << 2 | c2 >> 4);

            if chunk.len() > 2 {
                let c3 = decode_char(chunk[2])?;
                buffer.push((c2 & 0x0F) << 4 | c3 >> 2);

                if chunk.len() > 3 {
                    let c4 = decode_char(chunk[3])?;
                    buffer.push((c3 & 0x03) << 6 | c4);
                }
            }
        }

        Ok(buffer)
    }

    /// 返回內部存儲的 base64url 字符串的引用。
    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    /// 消耗實例並返回內部的 base64url 字符串。
    pub fn into_string(self) -> String {
        self.encoded
    }
}

impl std::fmt::Display for Base64Url {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encoded)
    }
}

/// 根據 base64url 字符返回其對應的數值。
///
/// # 錯誤
///
/// 當字符不在有效字符範圍內時返回 [`DecodeError::InvalidCharacter`]。
fn decode_char(c: u8) -> Result<u8, DecodeError> {
    match c {
        b'A'..=b'Z' => Ok(c - b'A'),
        b'a'..=b'z' => Ok(c - b'a' + 26),
        b'0'..=b'9' => Ok(c - b'0' + 52),
        b'-' => Ok(62),
        b'_' => Ok(63),
        _ => Err(DecodeError::InvalidCharacter(c)),
    }
}

/// 判斷給定字符是否屬於有效的 base64url 字符集合。
fn is_valid_char(c: u8) -> bool {
    matches!(c, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_encoding() {
        let base64 = Base64Url::encode("Hello, World!");
        assert_eq!(base64.as_str(), "SGVsbG8sIFdvcmxkIQ");
    }

    #[test]
    fn test_never_emits_padding() {
        for len in 0..32 {
            let input = vec![0xA5u8; len];
            let encoded = Base64Url::encode(&input);
            assert!(!encoded.as_str().contains('='));
        }
    }

    #[test]
    fn test_url_safe_alphabet() {
        // 0xFB 0xEF 0xBE 的六位元組皆為 62，標準 Base64 下會輸出 '+'
        let base64 = Base64Url::encode([0xFBu8, 0xEF, 0xBE]);
        assert_eq!(base64.as_str(), "----");
    }

    #[test]
    fn test_different_lengths() {
        assert_eq!(Base64Url::encode("a").as_str(), "YQ");
        assert_eq!(Base64Url::encode("ab").as_str(), "YWI");
        assert_eq!(Base64Url::encode("abc").as_str(), "YWJj");
    }

    #[test]
    fn test_empty_json_object() {
        // ACME 的空載荷 {} 的編碼
        assert_eq!(Base64Url::encode("{}").as_str(), "e30");
    }

    #[test]
    fn test_roundtrip() {
        let inputs: Vec<Vec<u8>> = vec![
            b"".to_vec(),
            b"f".to_vec(),
            b"fo".to_vec(),
            b"foo".to_vec(),
            vec![0xFF, 0x00, 0xFF],
            (0u8..=255).collect(),
        ];
        for input in inputs {
            let encoded = Base64Url::encode(&input);
            assert_eq!(encoded.decode().unwrap(), input);
        }
    }

    #[test]
    fn test_decode_known_value() {
        let base64 = Base64Url::from_encoded("SGVsbG8sIFdvcmxkIQ").unwrap();
        assert_eq!(base64.decode().unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_invalid_char() {
        assert!(matches!(
            Base64Url::from_encoded("SGVsbG8$"),
            Err(DecodeError::InvalidCharacter(b'$'))
        ));
        // 填充字符在 url 安全格式中不合法
        assert!(matches!(
            Base64Url::from_encoded("YQ=="),
            Err(DecodeError::InvalidCharacter(b'='))
        ));
    }

    #[test]
    fn test_invalid_length() {
        assert!(matches!(
            Base64Url::from_encoded("AAAAA"),
            Err(DecodeError::InvalidLength)
        ));
    }
}
