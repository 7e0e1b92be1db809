//! Authenticated customer identity and login payloads.

use serde::{Deserialize, Serialize};

/// Represents the customer account returned by login endpoints, including company scoping.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserProfile {
    pub seq: i64,
    pub login_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub company_name: Option<String>,
    pub company_id: Option<i64>,
}

impl UserProfile {
    /// Best label for the header: name, then login id.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.login_id)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
    #[serde(default)]
    pub is_first_login: bool,
}

/// Response of the emailed estimate link verification.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EstimateLinkLogin {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
    pub estimate_id: i64,
    #[serde(default)]
    pub estimate_status: Option<String>,
}

/// Response of the emailed contract link verification.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ContractLinkLogin {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
    pub contract_id: i64,
    pub estimate_id: Option<i64>,
    #[serde(default)]
    pub contract_status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LoginRequest {
    pub login_id: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SiteKeyLoginRequest {
    pub site_key: String,
    pub login_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}
