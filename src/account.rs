//! 模塊提供 ACME 帳戶生命週期管理功能：帳戶查詢、帳戶停用與金鑰輪替。
//!
//! 所有操作共用同一條請求管線：取得 nonce、組裝保護頭、簽名、
//! 發送、更新 nonce 快取，順序嚴格不可顛倒。

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::{
    base64::Base64Url,
    directory::{Directory, DirectoryError},
    jws::{Jws, JwsError},
    nonce::{NonceCache, NonceError},
    payload::{DeactivateAccountPayload, KeyChangePayload, LookupAccountPayload, PayloadT},
    protection::{Identity, ProtectedHeader, ProtectionError},
    signer::{Signer, SignerError},
    transport::{send_signed, HttpExchange, HttpResponse, TransportError},
};

/// 錯誤類型，用於描述在處理 ACME 帳戶相關操作時可能發生的各類錯誤。
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Request error: {0}")]
    Transport(#[from] TransportError),
    #[error("Nonce error: {0}")]
    Nonce(#[from] NonceError),
    #[error("Signing error: {0}")]
    Signer(#[from] SignerError),
    #[error("JWS error: {0}")]
    Jws(#[from] JwsError),
    #[error("Protection error: {0}")]
    Protection(#[from] ProtectionError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),
    #[error("Request header error: {0}")]
    RequestHeader(#[from] reqwest::header::ToStrError),
    /// CA 找不到與該金鑰對應的帳戶，或查詢被拒絕。
    #[error("Error looking for account URL: {status} {body}")]
    AccountNotFound { status: u16, body: Value },
    /// 查詢成功但回應缺少 `Location` 標頭。
    #[error("Location header not found in account response")]
    MissingLocation,
    /// CA 拒絕了停用請求。
    #[error("Error while deactivating the account key: {status} {body}")]
    DeactivationFailed { status: u16, body: Value },
    /// CA 拒絕了金鑰輪替請求。
    #[error("Error while rolling over the account key: {status} {body}")]
    RolloverFailed { status: u16, body: Value },
    /// 尚未查詢到帳戶 URL 即嘗試已驗證操作。
    #[error("Account URL is not known yet, call lookup first")]
    UnknownAccount,
    /// 帳戶已在本次程序中停用，不得再發送任何已驗證請求。
    #[error("Account has already been deactivated")]
    AlreadyDeactivated,
}

/// 結果類型，當操作成功返回 `T`，失敗則返回 [`AccountError`].
pub type Result<T> = std::result::Result<T, AccountError>;

/// 帳戶身份的狀態機。
///
/// `lookup` 使 **Unknown** 轉移至 **Known**；`deactivate` 使 **Known**
/// 轉移至終態 **Deactivated**；`rollover` 更換金鑰但帳戶 URL 不變，
/// 狀態停留在 **Known**。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountState {
    /// 帳戶 URL 尚未可知。
    Unknown,
    /// 帳戶 URL 已確認，可進行已驗證操作。
    Known {
        /// 帳戶的資源 URL，即後續請求的 `kid`。
        kid: String,
    },
    /// 帳戶已永久停用（終態）。
    Deactivated,
}

/// 表示一個 ACME 帳戶的生命週期引擎。
///
/// 引擎持有目錄與 nonce 快取，不持有任何金鑰材料；
/// 每個操作以 [`Signer`] 能力參數取得所需的簽名。
pub struct Account<'a> {
    /// HTTP 傳輸層。
    http: &'a dyn HttpExchange,
    /// ACME 服務目錄。
    directory: Directory,
    /// 用於防止重放攻擊的 nonce 快取。
    nonces: NonceCache,
    /// 帳戶身份的目前狀態。
    state: AccountState,
}

impl<'a> Account<'a> {
    /// 取得 ACME 目錄並建立一個狀態為 **Unknown** 的引擎實例。
    ///
    /// # 參數
    ///
    /// - `http`: 實作了 [`HttpExchange`] 的傳輸層。
    /// - `directory_url`: ACME 目錄的 URL。
    ///
    /// # Errors
    ///
    /// 返回 [`AccountError::Directory`] 當目錄無法取得或缺少必要端點時。
    pub fn discover(http: &'a dyn HttpExchange, directory_url: &str) -> Result<Self> {
        info!("Fetching information from the ACME directory");
        let directory = Directory::fetch(http, directory_url)?;

        Ok(Account {
            http,
            directory,
            nonces: NonceCache::new(),
            state: AccountState::Unknown,
        })
    }

    /// 回傳帳戶身份的目前狀態。
    pub fn state(&self) -> &AccountState {
        &self.state
    }

    /// 回傳帳戶 URL（若已知）。
    pub fn kid(&self) -> Option<&str> {
        match &self.state {
            AccountState::Known { kid } => Some(kid),
            _ => None,
        }
    }

    /// 回傳引擎持有的 ACME 目錄。
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// 以金鑰的公鑰查詢既有帳戶的 URL。
    ///
    /// 以 `jwk` 模式向 `newAccount` 端點發送 `{"onlyReturnExisting": true}`。
    /// 成功（HTTP 200）時從 `Location` 標頭提取帳戶 URL，
    /// 狀態轉移至 **Known** 並回傳該 URL。
    ///
    /// # Errors
    ///
    /// 返回 [`AccountError::AccountNotFound`] 當 CA 回應非 200 狀態時，
    /// 錯誤中保留 CA 的原始回應主體。
    pub fn lookup(&mut self, signer: &dyn Signer) -> Result<String> {
        info!("Asking the CA for the account URL");

        let url = self.directory.new_account.clone();
        let payload = LookupAccountPayload::new().to_base64()?;
        let identity = Identity::PublicKey(signer.public_jwk()?);

        let response = self.signed_post(&url, identity, &payload, signer)?;
        if response.status != 200 {
            return Err(AccountError::AccountNotFound {
                status: response.status,
                body: response.json(),
            });
        }

        let kid = response
            .headers
            .get("Location")
            .ok_or(AccountError::MissingLocation)?
            .to_str()?
            .to_string();

        info!("Account URL found: {kid}");
        self.state = AccountState::Known { kid: kid.clone() };
        Ok(kid)
    }

    /// 永久停用帳戶。
    ///
    /// 以 `kid` 模式向帳戶 URL 發送 `{"status": "deactivated"}`。
    /// 停用不可逆：成功後狀態轉移至終態 **Deactivated**，
    /// 該金鑰不得再發送任何已驗證請求。
    ///
    /// # Errors
    ///
    /// 返回 [`AccountError::DeactivationFailed`] 當 CA 回應非 200 狀態時
    /// （包括帳戶已在伺服器端停用的情況），
    /// 或 [`AccountError::UnknownAccount`] 當尚未執行 `lookup` 時。
    pub fn deactivate(&mut self, signer: &dyn Signer) -> Result<()> {
        let kid = self.require_kid()?;
        info!("Deactivating the account");

        let payload = DeactivateAccountPayload::new().to_base64()?;
        let identity = Identity::AccountUrl(kid.clone());

        let response = self.signed_post(&kid, identity, &payload, signer)?;
        if response.status != 200 {
            return Err(AccountError::DeactivationFailed {
                status: response.status,
                body: response.json(),
            });
        }

        self.state = AccountState::Deactivated;
        info!("Account key deactivated !");
        Ok(())
    }

    /// 將帳戶輪替到一對新金鑰，帳戶 URL 保持不變。
    ///
    /// 輪替採用雙層信封：內層 JWS 由舊金鑰以 `kid` 模式簽署，
    /// 載荷宣告帳戶 URL 與新金鑰的公開參數；整個內層信封再作為
    /// 外層 JWS 的載荷，由新金鑰以 `jwk` 模式簽署後發送至
    /// `keyChange` 端點。內外兩層各自取得一個全新的 nonce，
    /// 兩個簽名都必須在伺服器端驗證通過，輪替才會生效。
    ///
    /// # 參數
    ///
    /// - `old_signer`: 目前與帳戶關聯的金鑰。
    /// - `new_signer`: 即將接管帳戶的新金鑰。
    ///
    /// # Errors
    ///
    /// 返回 [`AccountError::RolloverFailed`] 當 CA 回應非 200 狀態時。
    /// 注意輪替不具冪等性：若 CA 已接受新金鑰但回應遺失，
    /// 以同一對金鑰重試可能被拒絕。
    pub fn rollover(&mut self, old_signer: &dyn Signer, new_signer: &dyn Signer) -> Result<()> {
        let kid = self.require_kid()?;
        info!("Rolling over the account keys");

        let url = self.directory.key_change.clone();
        let new_nonce_url = self.directory.new_nonce.clone();

        // 內層：舊金鑰對帳戶 URL 與新公鑰的背書
        let inner_payload = KeyChangePayload::new(kid.as_str(), new_signer.public_jwk()?).to_base64()?;
        let inner_nonce = self.nonces.acquire(self.http, &new_nonce_url)?;
        let inner_header = ProtectedHeader::new(
            old_signer.algorithm(),
            Identity::AccountUrl(kid.clone()),
            inner_nonce,
            url.as_str(),
        );
        let inner = Jws::create(&inner_header, &inner_payload, old_signer)?;

        // 外層：新金鑰以 jwk 模式包裹內層信封
        let outer_payload = inner.to_base64()?;
        let identity = Identity::PublicKey(new_signer.public_jwk()?);
        let response = self.signed_post(&url, identity, &outer_payload, new_signer)?;

        if response.status != 200 {
            return Err(AccountError::RolloverFailed {
                status: response.status,
                body: response.json(),
            });
        }

        info!("Account keys rolled over !");
        Ok(())
    }

    /// 取得已知的帳戶 URL，或回報狀態機違規。
    fn require_kid(&self) -> Result<String> {
        match &self.state {
            AccountState::Known { kid } => Ok(kid.clone()),
            AccountState::Unknown => Err(AccountError::UnknownAccount),
            AccountState::Deactivated => Err(AccountError::AlreadyDeactivated),
        }
    }

    /// 完成一次簽名請求：取得 nonce、組裝保護頭、簽名並發送。
    ///
    /// nonce 的取得永遠先於信封組裝，發送後由傳輸層立即更新快取，
    /// 因此從呼叫者的角度看，nonce 的消耗與請求的建構是原子的。
    fn signed_post(
        &mut self,
        url: &str,
        identity: Identity,
        payload_b64: &Base64Url,
        signer: &dyn Signer,
    ) -> Result<HttpResponse> {
        let new_nonce_url = self.directory.new_nonce.clone();
        let nonce = self.nonces.acquire(self.http, &new_nonce_url)?;

        let header = ProtectedHeader::new(signer.algorithm(), identity, nonce, url);
        let jws = Jws::create(&header, payload_b64, signer)?;

        Ok(send_signed(self.http, &mut self.nonces, url, &jws)?)
    }
}
