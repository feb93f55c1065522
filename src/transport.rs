//! 此模組提供 ACME 引擎所需的最小 HTTP 傳輸層：
//! 以 [`HttpExchange`] 特徵抽象出目錄查詢、nonce 取得與簽名請求三種交換，
//! 並負責在每一次回應後更新 nonce 快取。

use reqwest::blocking::Client;
use serde_json::{json, Value};
use thiserror::Error;

use crate::{jws::Jws, nonce::NonceCache};

/// 所有請求使用的固定產品識別字串。
pub const PRODUCT_IDENTIFIER: &str =
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// 表示傳輸層可能發生的錯誤類型。
#[derive(Debug, Error)]
pub enum TransportError {
    /// 網路層請求失敗（連線錯誤、逾時等）。
    #[error("Failed to make request: {0}")]
    Request(#[from] reqwest::Error),
    /// JWS 信封序列化失敗。
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// JWS 信封建立或序列化失敗。
    #[error("JWS error: {0}")]
    Jws(#[from] crate::jws::JwsError),
}

/// 統一化的 HTTP 回應：狀態碼、回應標頭與原始回應主體。
///
/// CA 即使在錯誤狀態下也會回傳帶有 `Replay-Nonce` 標頭與 JSON 錯誤主體的
/// 回應，因此 HTTP 層級的錯誤狀態在此被視為正常資料路徑，而非例外。
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP 狀態碼。
    pub status: u16,
    /// 回應標頭。
    pub headers: reqwest::header::HeaderMap,
    /// 原始回應主體。
    pub body: String,
}

impl HttpResponse {
    /// 建立一個新的 `HttpResponse` 實例。
    pub fn new(status: u16, headers: reqwest::header::HeaderMap, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// 判斷狀態碼是否為成功（2xx）。
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 將回應主體解析為 JSON 值。
    ///
    /// 空主體視為空的 JSON 物件 `{}`；無法解析為 JSON 的主體
    /// 以字串值原樣呈現，確保 CA 的錯誤內容不會遺失。
    pub fn json(&self) -> Value {
        if self.body.trim().is_empty() {
            return json!({});
        }
        serde_json::from_str(&self.body).unwrap_or_else(|_| Value::String(self.body.clone()))
    }
}

/// 定義 ACME 引擎所需的三種 HTTP 交換行為。
pub trait HttpExchange {
    /// 發送 GET 請求（目錄查詢）。
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;

    /// 發送 HEAD 請求（nonce 取得）。
    fn head(&self, url: &str) -> Result<HttpResponse, TransportError>;

    /// 以 `application/jose+json` 內容類型發送 POST 請求（簽名請求）。
    fn post_jose(&self, url: &str, body: &str) -> Result<HttpResponse, TransportError>;
}

/// 透過 `reqwest` 發送同步 HTTP 請求的實作。
#[derive(Debug, Default)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// 建立一個新的 `HttpClient` 實例。
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    fn convert(response: reqwest::blocking::Response) -> Result<HttpResponse, TransportError> {
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text()?;
        Ok(HttpResponse::new(status, headers, body))
    }
}

impl HttpExchange for HttpClient {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", PRODUCT_IDENTIFIER)
            .send()?;
        Self::convert(response)
    }

    fn head(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .head(url)
            .header("User-Agent", PRODUCT_IDENTIFIER)
            .send()?;
        Self::convert(response)
    }

    fn post_jose(&self, url: &str, body: &str) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header("User-Agent", PRODUCT_IDENTIFIER)
            .header("Content-Type", "application/jose+json")
            .body(body.to_string())
            .send()?;
        Self::convert(response)
    }
}

/// 發送一個已簽名的 JWS 信封，並在收到回應後立即更新 nonce 快取。
///
/// 無論回應狀態成功與否，只要拿到回應就會先消化其中的 `Replay-Nonce`
/// 標頭，再將回應交還給呼叫者；唯有網路層失敗（完全沒有回應）時
/// 快取才保持不變。
///
/// # 錯誤
///
/// 回傳 [`TransportError`] 當信封序列化或網路請求失敗時。
pub fn send_signed(
    http: &dyn HttpExchange,
    nonces: &mut NonceCache,
    url: &str,
    jws: &Jws,
) -> Result<HttpResponse, TransportError> {
    let body = jws.to_json()?;
    let result = http.post_jose(url, &body);

    if let Ok(response) = &result {
        nonces.update(&response.headers);
    }

    result
}


#[cfg(test)]
mod tests {
    use super::testing::{response, MockHttp};
    use super::*;
    use crate::nonce::NonceCache;
    use crate::protection::{Identity, ProtectedHeader};
    use crate::signer::MockSigner;
    use crate::{base64::Base64Url, jwk::Jwk};

    fn dummy_jws() -> Jws {
        let header = ProtectedHeader::new(
            "RS256",
            Identity::AccountUrl("https://ca/acct/1".to_string()),
            "nonce-1",
            "https://ca/acct/1",
        );
        let payload = Base64Url::encode("{}");
        let signer = MockSigner::new(Jwk::rsa(&[0xC2, 0xD3], &[1, 0, 1]), vec![0xAB; 4]);
        Jws::create(&header, &payload, &signer).unwrap()
    }

    #[test]
    fn test_empty_body_is_empty_object() {
        let resp = response(204, &[], "");
        assert_eq!(resp.json(), serde_json::json!({}));
    }

    #[test]
    fn test_non_json_body_surfaced_verbatim() {
        let resp = response(502, &[], "bad gateway");
        assert_eq!(resp.json(), serde_json::Value::String("bad gateway".into()));
    }

    #[test]
    fn test_send_signed_updates_nonce_on_success() {
        let http = MockHttp::new();
        http.push_response(response(200, &[("Replay-Nonce", "next")], "{}"));
        let mut nonces = NonceCache::new();

        let resp = send_signed(&http, &mut nonces, "https://ca/acct/1", &dummy_jws()).unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(nonces.cached(), Some("next"));

        let requests = http.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert!(requests[0].body.as_deref().unwrap().contains("\"protected\""));
    }

    #[test]
    fn test_send_signed_updates_nonce_on_http_error() {
        let http = MockHttp::new();
        http.push_response(response(403, &[("Replay-Nonce", "after-error")], "{\"type\":\"urn:ietf:params:acme:error:unauthorized\"}"));
        let mut nonces = NonceCache::new();

        let resp = send_signed(&http, &mut nonces, "https://ca/acct/1", &dummy_jws()).unwrap();
        assert!(!resp.is_success());
        assert_eq!(nonces.cached(), Some("after-error"));
    }

    #[test]
    fn test_missing_nonce_header_leaves_cache_empty() {
        let http = MockHttp::new();
        http.push_response(response(500, &[], ""));
        let mut nonces = NonceCache::new();

        send_signed(&http, &mut nonces, "https://ca/acct/1", &dummy_jws()).unwrap();
        assert_eq!(nonces.cached(), None);
    }
}
