//! Login flows: credentials, site key, emailed estimate/contract links and password change.

use serde::Serialize;
use tracing::info;

use crate::client::PortalClient;
use crate::error::Result;
use crate::models::{
    ChangePasswordRequest, ContractLinkLogin, EstimateLinkLogin, LoginRequest, LoginResponse,
    MessageResponse, SiteKeyLoginRequest,
};

#[derive(Serialize)]
struct EstimateTokenQuery<'a> {
    token: &'a str,
    estimate_id: i64,
}

#[derive(Serialize)]
struct ContractTokenQuery<'a> {
    token: &'a str,
    contract_id: i64,
}

impl PortalClient {
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        info!(login_id = %request.login_id, "credential login");
        self.post("auth/login", request).await
    }

    /// Automatic login when the portal is opened from a company site with `key` and `login_id`.
    pub async fn site_key_login(&self, request: &SiteKeyLoginRequest) -> Result<LoginResponse> {
        info!(login_id = %request.login_id, "site key login");
        self.post("auth/site-key-login", request).await
    }

    pub async fn verify_estimate_link(&self, token: &str, estimate_id: i64) -> Result<EstimateLinkLogin> {
        let query = EstimateTokenQuery { token, estimate_id };
        self.get_with_query("estimates/auth/verify-token", &query).await
    }

    pub async fn verify_contract_link(&self, token: &str, contract_id: i64) -> Result<ContractLinkLogin> {
        let query = ContractTokenQuery { token, contract_id };
        self.get_with_query("estimates/contracts/auth/verify-token", &query)
            .await
    }

    pub async fn change_password(&self, request: &ChangePasswordRequest) -> Result<MessageResponse> {
        self.post("auth/change-password", request).await
    }
}
