//! 此模組提供用於處理 JSON Web Signature (JWS) 的基本結構與操作，
//! 例如建立緊湊形式的 JWS 信封與序列化成 JSON 字串。

use std::result;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    base64::Base64Url,
    protection::{ProtectedHeader, ProtectionError},
    signer::{Signer, SignerError},
};

/// 表示與 JWS 相關的錯誤。
#[derive(Debug, Error)]
pub enum JwsError {
    /// 當保護頭處理失敗時回傳此錯誤。
    #[error("Protection error: {0}")]
    Protection(#[from] ProtectionError),
    /// 當簽名生成失敗時回傳此錯誤。
    #[error("Signing error: {0}")]
    Signing(#[from] SignerError),
    /// 當 JSON 序列化或反序列化過程中發生錯誤時回傳此錯誤。
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

type Result<T> = result::Result<T, JwsError>;

/// 表示一個 ACME 風格的緊湊 JSON Web Signature (JWS) 信封。
///
/// 此物件包含三個部分，皆為 base64url 編碼後的字串：
/// - `protected`：保護頭。
/// - `payload`：負載資料。
/// - `signature`：對 `protected "." payload` 這個 ASCII 字串的簽名。
#[derive(Debug, Serialize, Deserialize)]
pub struct Jws {
    protected: String,
    payload: String,
    signature: String,
}

impl Jws {
    /// 以給定的保護頭、載荷與簽名能力建立一個 `Jws` 信封。
    ///
    /// 簽名的輸入固定為 `protected64 + "." + payload64`，
    /// 與 RFC 7515 的緊湊序列化格式一致。
    ///
    /// # 參數
    ///
    /// - `header`: 已填入 nonce 與目標 URL 的保護頭。
    /// - `payload_b64`: 已完成 base64url 編碼的載荷。
    /// - `signer`: 執行實際簽名的能力介面。
    ///
    /// # 回傳
    ///
    /// 回傳一個 `Result` 包含成功建立的 `Jws` 實例，或是遇到錯誤時回傳相應錯誤。
    pub fn create(
        header: &ProtectedHeader,
        payload_b64: &Base64Url,
        signer: &dyn Signer,
    ) -> Result<Self> {
        let protected_b64 = header.to_base64()?;
        let signing_input = format!("{}.{}", protected_b64.as_str(), payload_b64.as_str());
        let signature = signer.sign(signing_input.as_bytes())?;

        Ok(Jws {
            protected: protected_b64.into_string(),
            payload: payload_b64.as_str().to_string(),
            signature: Base64Url::encode(&signature).into_string(),
        })
    }

    /// 將 `Jws` 實例序列化為 JSON 格式的字串，作為 HTTP 請求主體。
    ///
    /// # 回傳
    ///
    /// - 成功時，回傳包含 JWS JSON 表示的 `String`。
    /// - 發生序列化錯誤時，回傳 `JwsError::Json`。
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// 將整個信封的 JSON 表示進行 base64url 編碼。
    ///
    /// 金鑰輪替時，內層信封即以此形式成為外層 JWS 的載荷。
    pub fn to_base64(&self) -> Result<Base64Url> {
        Ok(Base64Url::encode(self.to_json()?.as_bytes()))
    }

    /// 取得 `protected` 欄位。
    pub fn protected(&self) -> &str {
        &self.protected
    }

    /// 取得 `payload` 欄位。
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// 取得 `signature` 欄位。
    pub fn signature(&self) -> &str {
        &self.signature
    }
}
