//! # ACME 帳戶生命週期管理庫
//!
//! 本庫實作 ACME 協議（RFC 8555）中與帳戶管理相關的簽名請求引擎，
//! 涵蓋以下操作：
//!
//! - **帳戶查詢**：以既有金鑰的公鑰向 CA 查詢帳戶 URL（`onlyReturnExisting`）。
//! - **帳戶停用**：向帳戶 URL 發送停用請求，此操作不可逆。
//! - **金鑰輪替**：以雙層 JWS 信封將帳戶輪替到一對新金鑰，帳戶 URL 不變。
//!
//! ## 特性
//!
//! - 每個簽名請求自動管理防重放 nonce：取得、消耗與回應後的更新
//!   構成嚴格的先後順序，同一個 nonce 絕不重複使用。
//! - 保護頭依請求類型自動選擇 `jwk` 或 `kid` 身份識別，兩者互斥。
//! - 金鑰材料不進入引擎：簽名透過能力介面委託給外部 `openssl`
//!   執行檔或記憶體內的金鑰實作。
//! - CA 的錯誤回應完整保留於錯誤類型中，不被吞沒，也不自動重試。
//!
//! ## 示例
//!
//! 以下示例展示如何查詢並停用一個既有的 ACME 帳戶：
//!
//! ```no_run
//! use racme_account::{account::Account, signer::CommandSigner, transport::HttpClient};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let http = HttpClient::new();
//!     let key = CommandSigner::new("account.key");
//!
//!     // 1. 取得目錄並查詢帳戶 URL
//!     let mut account = Account::discover(
//!         &http,
//!         "https://acme-staging-v02.api.letsencrypt.org/directory",
//!     )?;
//!     account.lookup(&key)?;
//!
//!     // 2. 永久停用帳戶（請先撤銷所有憑證！）
//!     account.deactivate(&key)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! 金鑰輪替需要兩把金鑰，舊金鑰完成最後一次身份背書：
//!
//! ```no_run
//! use racme_account::{account::Account, signer::CommandSigner, transport::HttpClient};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let http = HttpClient::new();
//!     let old_key = CommandSigner::new("account.key");
//!     let new_key = CommandSigner::new("new_account.key");
//!
//!     let mut account = Account::discover(
//!         &http,
//!         "https://acme-staging-v02.api.letsencrypt.org/directory",
//!     )?;
//!     account.lookup(&old_key)?;
//!     account.rollover(&old_key, &new_key)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! 更多詳細 API 說明請參考各個模組的文檔。

pub mod account;
pub mod base64;
pub mod directory;
pub mod jwk;
pub mod jws;
pub mod nonce;
pub mod payload;
pub mod protection;
pub mod signer;
pub mod transport;
