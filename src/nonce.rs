use reqwest::header::HeaderMap;
use thiserror::Error;

use crate::transport::{HttpExchange, TransportError};

/// CA 回應中攜帶防重放 nonce 的標頭名稱。
const REPLAY_NONCE: &str = "Replay-Nonce";

/// 表示在取得 Nonce 時可能發生的錯誤狀況。
#[derive(Debug, Error)]
pub enum NonceError {
    /// 當請求過程中發生錯誤時回傳此錯誤。
    #[error("Failed to make request: {0}")]
    Transport(#[from] TransportError),
    /// 當回應中缺少 `Replay-Nonce` 標頭時回傳此錯誤。
    #[error("No Replay-Nonce header found in response")]
    NoNonceHeader,
    /// 當標頭值無法轉換成字串時回傳此錯誤。
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] reqwest::header::ToStrError),
}

/// 單一值的 nonce 快取。
///
/// 整個引擎同一時間最多只持有一個尚未使用的 nonce：
/// [`acquire`](Self::acquire) 取走快取值（或在快取為空時向 `newNonce`
/// 端點發送 HEAD 請求取得新值），而每一次收到 CA 回應後都應呼叫
/// [`update`](Self::update) 將回應附帶的新 nonce 存回快取。
/// 取走即消耗，同一個 nonce 不可能被兩個請求使用。
#[derive(Debug, Default)]
pub struct NonceCache {
    value: Option<String>,
}

impl NonceCache {
    /// 建立一個空的 `NonceCache` 實例。
    pub fn new() -> Self {
        Self { value: None }
    }

    /// 取得一個可用的 nonce，並將其從快取中移除。
    ///
    /// 若快取為空，則對 `new_nonce_url` 發送 HEAD 請求，
    /// 從回應的 `Replay-Nonce` 標頭取得新值。
    ///
    /// # 錯誤
    ///
    /// 回傳 [`NonceError::NoNonceHeader`] 當回應缺少該標頭時，
    /// 或 [`NonceError::Transport`] 當請求失敗時。
    pub fn acquire(
        &mut self,
        http: &dyn HttpExchange,
        new_nonce_url: &str,
    ) -> Result<String, NonceError> {
        if let Some(nonce) = self.value.take() {
            return Ok(nonce);
        }

        let response = http.head(new_nonce_url)?;
        match response.headers.get(REPLAY_NONCE) {
            Some(nonce) => Ok(nonce.to_str()?.to_string()),
            None => Err(NonceError::NoNonceHeader),
        }
    }

    /// 以回應標頭中的 `Replay-Nonce` 無條件覆寫快取。
    ///
    /// 錯誤回應同樣攜帶新的 nonce，因此每一次交換後都應呼叫此方法；
    /// 若標頭不存在則快取保持原狀。
    pub fn update(&mut self, headers: &HeaderMap) {
        if let Some(value) = headers.get(REPLAY_NONCE) {
            if let Ok(nonce) = value.to_str() {
                self.value = Some(nonce.to_string());
            }
        }
    }

    /// 回傳目前快取中的 nonce（不消耗）。
    pub fn cached(&self) -> Option<&str> {
        self.value.as_deref()
    }
}
