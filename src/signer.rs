//! 此模組封裝帳戶金鑰的簽名能力。
//!
//! 引擎本身從不解析或保存私鑰位元組：[`CommandSigner`] 將簽名與公鑰
//! 檢視委託給外部的 `openssl` 執行檔，僅從其文字輸出提取公開參數；
//! [`PemSigner`] 則是以 OpenSSL 函式庫實作的記憶體內版本，
//! 供不便呼叫外部程序的場合與測試使用。

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use openssl::{
    hash::MessageDigest,
    pkey::{PKey, Private},
    rsa::Rsa,
};
use regex::Regex;
use thiserror::Error;

use crate::jwk::Jwk;

/// 表示簽名能力可能發生的錯誤狀況。
#[derive(Debug, Error)]
pub enum SignerError {
    /// 無法啟動外部簽名程序（執行檔不存在、權限不足等）。
    #[error("Failed to invoke openssl: {0}")]
    Io(#[from] std::io::Error),
    /// 外部簽名程序以非零狀態結束，附帶其標準錯誤輸出。
    #[error("OpenSSL error: {0}")]
    CommandFailed(String),
    /// 金鑰檢視輸出無法解析出公開參數。
    #[error("Failed to parse key inspection output: {0}")]
    KeyParse(String),
    /// OpenSSL 函式庫錯誤。
    #[error("OpenSSL library error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),
}

/// 定義簽名能力的介面。
///
/// 實作者需能對任意位元組串生成原始簽名，並提供金鑰的公開參數
/// 以建構 JWS 保護頭中的 `jwk` 欄位。
pub trait Signer {
    /// 回傳此金鑰對應的 JWS 演算法名稱（RSA 金鑰為 `"RS256"`）。
    fn algorithm(&self) -> &str;

    /// 使用金鑰對資料進行簽名，回傳原始簽名位元組。
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, SignerError>;

    /// 回傳金鑰公開參數的 JWK 表示。
    fn public_jwk(&self) -> Result<Jwk, SignerError>;
}

/// 委託外部 `openssl` 執行檔進行簽名的實作。
///
/// 私鑰檔案僅以路徑形式傳遞給外部程序，金鑰內容不會進入本程序的
/// 記憶體；公開參數從 `openssl rsa -noout -text` 的文字輸出解析而來。
#[derive(Debug)]
pub struct CommandSigner {
    key_path: PathBuf,
}

impl CommandSigner {
    /// 建立一個新的 `CommandSigner` 實例。
    ///
    /// # 參數
    ///
    /// - `key_path`: PEM 格式私鑰檔案的路徑。
    pub fn new(key_path: impl Into<PathBuf>) -> Self {
        Self {
            key_path: key_path.into(),
        }
    }

    /// 執行一次 openssl 命令，可選擇經由標準輸入傳遞資料。
    ///
    /// # 錯誤
    ///
    /// 回傳 [`SignerError::CommandFailed`] 當命令以非零狀態結束時，
    /// 錯誤中保留完整的標準錯誤輸出以輔助診斷。
    fn openssl(&self, args: &[&str], input: Option<&[u8]>) -> Result<Vec<u8>, SignerError> {
        let mut child = Command::new("openssl")
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(data) = input {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(data)?;
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(SignerError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        Ok(output.stdout)
    }
}

impl Signer for CommandSigner {
    fn algorithm(&self) -> &str {
        "RS256"
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, SignerError> {
        let path = self.key_path.to_string_lossy();
        self.openssl(&["dgst", "-sha256", "-sign", path.as_ref()], Some(data))
    }

    fn public_jwk(&self) -> Result<Jwk, SignerError> {
        let path = self.key_path.to_string_lossy();
        let output = self.openssl(&["rsa", "-in", path.as_ref(), "-noout", "-text"], None)?;
        let text = String::from_utf8_lossy(&output);
        let (modulus, exponent) = parse_public_components(&text)?;
        Ok(Jwk::rsa(&modulus, &exponent))
    }
}

/// 從 `openssl rsa -noout -text` 的輸出解析出模數與公開指數。
///
/// 模數的十六進位區塊以 `00:` 開頭（openssl 對最高位元為 1 的整數
/// 附加的符號位元組），該前綴不屬於數值本身，解析時直接跳過。
fn parse_public_components(text: &str) -> Result<(Vec<u8>, Vec<u8>), SignerError> {
    let pattern = Regex::new(r"modulus:\r?\n\s+00:([a-f0-9:\s]+?)\r?\npublicExponent: ([0-9]+)")
        .map_err(|e| SignerError::KeyParse(e.to_string()))?;

    let captures = pattern
        .captures(text)
        .ok_or_else(|| SignerError::KeyParse("modulus or publicExponent not found".to_string()))?;

    let modulus_hex: String = captures[1]
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    let modulus = hex_to_bytes(&modulus_hex)?;

    let exponent: u64 = captures[2]
        .parse()
        .map_err(|e: std::num::ParseIntError| SignerError::KeyParse(e.to_string()))?;

    Ok((modulus, exponent.to_be_bytes().to_vec()))
}

/// 將十六進位字串轉換為位元組向量。
fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, SignerError> {
    if hex.len() % 2 != 0 {
        return Err(SignerError::KeyParse(format!(
            "odd-length hex string: {} digits",
            hex.len()
        )));
    }

    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| SignerError::KeyParse(e.to_string()))
        })
        .collect()
}

/// 以 OpenSSL 函式庫在記憶體內完成簽名的實作。
#[derive(Debug)]
pub struct PemSigner {
    key: PKey<Private>,
}

impl PemSigner {
    /// 根據 PEM 格式的私鑰資料建立實例。
    ///
    /// # 錯誤
    ///
    /// 回傳 [`SignerError::OpenSsl`] 當私鑰無法解析時。
    pub fn from_pem(pem: &[u8]) -> Result<Self, SignerError> {
        Ok(Self {
            key: PKey::private_key_from_pem(pem)?,
        })
    }

    /// 產生一組新的 RSA 金鑰並建立實例，主要供測試使用。
    ///
    /// # 參數
    ///
    /// - `bits`: RSA 金鑰長度（例如 2048）。
    pub fn generate(bits: u32) -> Result<Self, SignerError> {
        let rsa = Rsa::generate(bits)?;
        Ok(Self {
            key: PKey::from_rsa(rsa)?,
        })
    }
}

impl Signer for PemSigner {
    fn algorithm(&self) -> &str {
        "RS256"
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, SignerError> {
        let mut signer = openssl::sign::Signer::new(MessageDigest::sha256(), &self.key)?;
        signer.update(data)?;
        Ok(signer.sign_to_vec()?)
    }

    fn public_jwk(&self) -> Result<Jwk, SignerError> {
        let rsa = self.key.rsa()?;
        Ok(Jwk::rsa(&rsa.n().to_vec(), &rsa.e().to_vec()))
    }
}

/// 模擬簽名實作，回傳固定的簽名與公鑰，用於結構性測試。
#[derive(Debug, Clone)]
pub struct MockSigner {
    jwk: Jwk,
    signature: Vec<u8>,
}

impl MockSigner {
    /// 建立一個新的 `MockSigner` 實例，指定固定的 JWK 與簽名位元組。
    pub fn new(jwk: Jwk, signature: impl Into<Vec<u8>>) -> Self {
        Self {
            jwk,
            signature: signature.into(),
        }
    }
}

impl Signer for MockSigner {
    fn algorithm(&self) -> &str {
        "RS256"
    }

    fn sign(&self, _data: &[u8]) -> Result<Vec<u8>, SignerError> {
        Ok(self.signature.clone())
    }

    fn public_jwk(&self) -> Result<Jwk, SignerError> {
        Ok(self.jwk.clone())
    }
}
