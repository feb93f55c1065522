use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transport::{HttpExchange, TransportError};

/// 表示處理目錄操作時可能發生的錯誤類型。
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// JSON 解析或序列化錯誤。
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// HTTP 請求錯誤。
    #[error("Request error: {0}")]
    Transport(#[from] TransportError),
    /// 目錄端點回應了非成功狀態。
    #[error("Directory request failed with status {0}")]
    Status(u16),
}

/// 簡化目錄操作結果的型別。
type DirectoryResult<T> = std::result::Result<T, DirectoryError>;

/// 表示 ACME 目錄，即操作名稱到絕對 URL 的映射。
///
/// 帳戶生命週期操作至少需要 `newNonce`、`newAccount` 與 `keyChange`
/// 三個端點；目錄在每次程序啟動時取得一次，之後視為不可變。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Directory {
    /// 用於取得新的 nonce 值的 API 路徑。
    #[serde(rename = "newNonce")]
    pub new_nonce: String,
    /// 用於帳戶查詢與註冊的 API 路徑。
    #[serde(rename = "newAccount")]
    pub new_account: String,
    /// 用於帳戶金鑰輪替的 API 路徑。
    #[serde(rename = "keyChange")]
    pub key_change: String,
    /// 用於訂單相關操作的 API 路徑，本引擎不使用，可能不存在。
    #[serde(rename = "newOrder")]
    pub new_order: Option<String>,
}

impl Directory {
    /// 從指定 URL 取得 `Directory` 實例。
    ///
    /// # 參數
    ///
    /// - `http`: 實作了 [`HttpExchange`] 的傳輸層。
    /// - `url`: 取得目錄資料的 API URL。
    ///
    /// # 回傳
    ///
    /// 成功時回傳 `Directory` 實例，否則回傳 `DirectoryError` 錯誤。
    pub fn fetch(http: &dyn HttpExchange, url: &str) -> DirectoryResult<Self> {
        let response = http.get(url)?;
        if !response.is_success() {
            return Err(DirectoryError::Status(response.status));
        }

        Ok(serde_json::from_str(&response.body)?)
    }
}
