use serde::{Deserialize, Serialize};

use crate::base64::Base64Url;

/// RSA 公鑰的 JSON Web Key (JWK) 表示，僅包含 ACME 所需的公開參數。
///
/// 欄位順序固定為 `e`、`kty`、`n`，與 RFC 7638 規定的字典序一致，
/// 序列化結果因此可以直接用於指紋計算與 JWS 保護頭。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Jwk {
    /// 公開指數，base64url 編碼的大端無符號整數。
    pub e: String,
    /// 金鑰類型，目前固定為 `"RSA"`。
    pub kty: String,
    /// 模數，base64url 編碼的大端無符號整數。
    pub n: String,
}

impl Jwk {
    /// 根據 RSA 公鑰的模數與指數建立 JWK。
    ///
    /// 兩個參數皆為大端序的無符號整數位元組。依 RFC 7518 的要求，
    /// 編碼前會先移除開頭的零位元組。
    ///
    /// # 參數
    ///
    /// - `n`: 模數的大端位元組。
    /// - `e`: 公開指數的大端位元組。
    pub fn rsa(n: &[u8], e: &[u8]) -> Self {
        Jwk {
            e: Base64Url::encode(strip_leading_zeros(e)).into_string(),
            kty: "RSA".to_string(),
            n: Base64Url::encode(strip_leading_zeros(n)).into_string(),
        }
    }

    /// 將 JWK 序列化為 JSON 格式字串。
    ///
    /// # 錯誤
    ///
    /// 若序列化失敗，則回傳 [`serde_json::Error`]。
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// 移除大端整數開頭的零位元組。
fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b != 0) {
        Some(start) => &bytes[start..],
        None => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_exponent() {
        // 65537 = 0x010001，編碼後為 "AQAB"
        let jwk = Jwk::rsa(&[0xC2, 0xD3], &[0x01, 0x00, 0x01]);
        assert_eq!(jwk.e, "AQAB");
        assert_eq!(jwk.kty, "RSA");
        assert_eq!(jwk.n, "wtM");
    }

    #[test]
    fn test_leading_zero_stripped() {
        let jwk = Jwk::rsa(&[0x00, 0x8F], &[0x00, 0x00, 0x03]);
        assert_eq!(jwk.n, "jw");
        assert_eq!(jwk.e, "Aw");
    }

    #[test]
    fn test_canonical_field_order() {
        let jwk = Jwk::rsa(&[0xC2, 0xD3], &[0x01, 0x00, 0x01]);
        let json = jwk.to_json().unwrap();
        assert_eq!(json, r#"{"e":"AQAB","kty":"RSA","n":"wtM"}"#);
    }
}
