use serde::Serialize;
use thiserror::Error;

use crate::{base64::Base64Url, jwk::Jwk};

/// 定義保護頭生成過程中可能產生的錯誤類型。
#[derive(Debug, Error)]
pub enum ProtectionError {
    /// JSON 序列化錯誤
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 自定義的結果型別，錯誤類型為 [`ProtectionError`]
type Result<T> = std::result::Result<T, ProtectionError>;

/// 請求的身份識別方式。
///
/// ACME 規定保護頭中 `jwk` 與 `kid` 恰好出現其一：
/// 帳戶 URL 尚未可知時（查詢、建立帳戶、輪替的新金鑰簽名）內嵌完整公鑰，
/// 其餘已驗證的請求一律以帳戶 URL 識別。
#[derive(Debug, Clone)]
pub enum Identity {
    /// 以完整公鑰識別（`jwk` 模式）。
    PublicKey(Jwk),
    /// 以帳戶 URL 識別（`kid` 模式）。
    AccountUrl(String),
}

/// 表示 JWS 保護頭的資料結構。
///
/// 除簽章演算法外，保護頭將簽名綁定到一次性的 nonce 與目標 URL，
/// 使被截獲的簽名信封無法重放，也無法改投其他端點。
#[derive(Debug, Serialize)]
pub struct ProtectedHeader {
    /// 簽章演算法
    alg: String,
    /// 可選的 JSON Web Key (JWK)
    #[serde(skip_serializing_if = "Option::is_none")]
    jwk: Option<Jwk>,
    /// 可選的密鑰標識符 (Key ID)
    #[serde(skip_serializing_if = "Option::is_none")]
    kid: Option<String>,
    /// 用於防止重放攻擊的一次性值
    nonce: String,
    /// 請求目標 URL
    url: String,
}

impl ProtectedHeader {
    /// 建立一個新的 [`ProtectedHeader`] 實例。
    ///
    /// # 參數
    ///
    /// - `alg`: 簽章演算法，如 `"RS256"`。
    /// - `identity`: 身份識別方式，決定填充 `jwk` 或 `kid` 欄位。
    /// - `nonce`: 已取得且尚未使用的 nonce。
    /// - `url`: 請求的目標 URL。
    pub fn new(
        alg: impl Into<String>,
        identity: Identity,
        nonce: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let (jwk, kid) = match identity {
            Identity::PublicKey(jwk) => (Some(jwk), None),
            Identity::AccountUrl(kid) => (None, Some(kid)),
        };

        ProtectedHeader {
            alg: alg.into(),
            jwk,
            kid,
            nonce: nonce.into(),
            url: url.into(),
        }
    }

    /// 將 [`ProtectedHeader`] 序列化後轉換為 base64url 格式。
    ///
    /// # Errors
    ///
    /// 如果序列化過程中發生錯誤，將返回 [`ProtectionError::Serialization`]。
    pub fn to_base64(&self) -> Result<Base64Url> {
        let json_str = serde_json::to_string(self)?;
        Ok(Base64Url::encode(json_str.as_bytes()))
    }

    /// 取得 `jwk` 欄位的引用（若存在）。
    pub fn jwk(&self) -> Option<&Jwk> {
        self.jwk.as_ref()
    }

    /// 取得 `kid` 欄位的引用（若存在）。
    pub fn kid(&self) -> Option<&str> {
        self.kid.as_deref()
    }
}

impl std::fmt::Display for ProtectedHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        serde_json::to_string(self)
            .map_err(|_| std::fmt::Error)
            .and_then(|s| write!(f, "{}", s))
    }
}
