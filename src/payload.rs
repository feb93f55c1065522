use serde::{Deserialize, Serialize};
use std::error::Error;

use crate::{base64::Base64Url, jwk::Jwk};

/// 定義所有 API 載荷（Payload）必須實作的功能。
///
/// 該 trait 要求實作者能夠序列化、反序列化，並提供轉換成 JSON 字串與
/// base64url 表示的功能，同時必須實作自定義的驗證邏輯。
pub trait PayloadT: Serialize + for<'de> Deserialize<'de> {
    /// 將載荷轉換成 JSON 格式的字串。
    ///
    /// # 錯誤
    ///
    /// 若序列化失敗，則回傳 [`serde_json::Error`]。
    fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// 將載荷先轉換成 JSON 字串，再以 base64url 進行編碼。
    ///
    /// # 錯誤
    ///
    /// 若轉換過程中發生錯誤，則回傳 [`serde_json::Error`]。
    fn to_base64(&self) -> Result<Base64Url, serde_json::Error> {
        let json_string = self.to_json_string()?;
        Ok(Base64Url::encode(json_string.as_bytes()))
    }

    /// 驗證載荷資料是否符合預期的規範。
    ///
    /// # 錯誤
    ///
    /// 若驗證失敗，則回傳對應的錯誤。
    fn validate(&self) -> Result<(), Box<dyn Error>>;
}

/// 表示以既有金鑰查詢帳戶 URL 所需的載荷資料。
///
/// `onlyReturnExisting` 告知 CA 只回傳既有帳戶而不建立新帳戶；
/// 若該金鑰沒有對應的帳戶，CA 會以錯誤狀態回應。
#[derive(Debug, Serialize, Deserialize)]
pub struct LookupAccountPayload {
    #[serde(rename = "onlyReturnExisting")]
    only_return_existing: bool,
}

impl LookupAccountPayload {
    /// 建立一個新的 `LookupAccountPayload` 實例。
    pub fn new() -> Self {
        LookupAccountPayload {
            only_return_existing: true,
        }
    }
}

impl Default for LookupAccountPayload {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadT for LookupAccountPayload {
    /// 驗證查詢載荷資料：查詢絕不能觸發帳戶建立。
    fn validate(&self) -> Result<(), Box<dyn Error>> {
        if !self.only_return_existing {
            return Err("Lookup must not create a new account".into());
        }
        Ok(())
    }
}

/// 表示停用帳戶所需的載荷資料。
///
/// 停用是不可逆的終態，CA 收到後即拒絕該帳戶的一切後續請求。
#[derive(Debug, Serialize, Deserialize)]
pub struct DeactivateAccountPayload {
    status: String,
}

impl DeactivateAccountPayload {
    /// 建立一個新的 `DeactivateAccountPayload` 實例，狀態固定為 `"deactivated"`。
    pub fn new() -> Self {
        DeactivateAccountPayload {
            status: "deactivated".to_string(),
        }
    }
}

impl Default for DeactivateAccountPayload {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadT for DeactivateAccountPayload {
    /// 驗證停用載荷資料：狀態必須為 `"deactivated"`。
    fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.status != "deactivated" {
            return Err("Status must be 'deactivated'".into());
        }
        Ok(())
    }
}

/// 表示金鑰輪替內層 JWS 的載荷資料。
///
/// 載荷宣告帳戶 URL 與即將生效的新公鑰；由舊金鑰簽署後，
/// 整個內層信封再成為外層 JWS 的載荷。
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyChangePayload {
    account: String,
    #[serde(rename = "newKey")]
    new_key: Jwk,
}

impl KeyChangePayload {
    /// 建立一個新的 `KeyChangePayload` 實例。
    ///
    /// # 參數
    ///
    /// - `account`: 帳戶的 URL（kid），輪替後保持不變。
    /// - `new_key`: 新金鑰的公開參數。
    pub fn new(account: impl Into<String>, new_key: Jwk) -> Self {
        KeyChangePayload {
            account: account.into(),
            new_key,
        }
    }
}

impl PayloadT for KeyChangePayload {
    /// 驗證金鑰輪替載荷資料：
    ///
    /// - 帳戶 URL 不得為空。
    /// - 新公鑰的模數與指數不得為空。
    fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.account.is_empty() {
            return Err("Account URL is required".into());
        }
        if self.new_key.n.is_empty() || self.new_key.e.is_empty() {
            return Err("New key public components are required".into());
        }
        Ok(())
    }
}
