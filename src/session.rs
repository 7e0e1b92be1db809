//! Application context and the login/logout flows built on it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hcms_api::models::{SiteKeyLoginRequest, UserProfile};
use hcms_api::{PortalClient, PortalConfig, PortalError};
use log::{info, warn};
use tokio::task::JoinHandle;

use crate::bridge::AuthOutcome;
use crate::config::Config;
use crate::forms::{self, ChangePasswordForm, LoginForm};
use crate::local_store::LocalStore;
use crate::navigation::{
    estimate_route, guard_route, NavigationStore, CHANGE_PASSWORD_ROUTE, DASHBOARD_ROUTE,
    ESTIMATES_ROUTE, LOGIN_ROUTE,
};
use crate::push::{PushRegistrar, PushService, PushState};
use crate::redact_log_details;
use crate::secrets::SecretsManager;
use crate::threads::{ReplyContext, ReplyScope, ReplyTarget};

pub const SESSION_REQUIRED_MESSAGE: &str = "로그인이 필요합니다.";
pub const SESSION_EXPIRED_MESSAGE: &str = "세션이 만료되었습니다. 다시 로그인해주세요.";
const LOGIN_FAILED: &str = "로그인에 실패했습니다. 다시 시도해주세요.";
const AUTO_LOGIN_FAILED: &str = "자동 로그인에 실패했습니다. 직접 로그인해주세요.";
const LINK_INVALID: &str = "잘못된 접근입니다. 이메일의 링크를 다시 확인해 주세요.";
const LINK_AUTH_FAILED: &str = "인증에 실패했습니다. 링크가 만료되었거나 유효하지 않습니다.";
const CHANGE_PASSWORD_FAILED: &str = "비밀번호 변경에 실패했습니다. 다시 시도해주세요.";

/// Everything the portal operations share: config, tokens, current user, layout state and push.
#[derive(Clone)]
pub struct AppContext {
    config: Arc<Mutex<Config>>,
    secrets: SecretsManager,
    local_store: LocalStore,
    navigation: NavigationStore,
    current_user: Arc<Mutex<Option<UserProfile>>>,
    reply: Arc<Mutex<ReplyContext>>,
    push: PushRegistrar,
    push_service: Arc<dyn PushService>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AppContext {
    pub fn new(config: Config, secrets: SecretsManager, local_store: LocalStore, push_service: Arc<dyn PushService>) -> Self {
        let navigation = NavigationStore::new(config.sidebar_open);
        let push = PushRegistrar::new(local_store.clone());
        Self {
            config: Arc::new(Mutex::new(config)),
            secrets,
            local_store,
            navigation,
            current_user: Arc::new(Mutex::new(None)),
            reply: Arc::new(Mutex::new(ReplyContext::default())),
            push,
            push_service,
        }
    }

    pub fn with_push_registrar(mut self, push: PushRegistrar) -> Self {
        self.push = push;
        self
    }

    pub fn config(&self) -> Config {
        lock(&self.config).clone()
    }

    pub fn replace_config(&self, config: Config) {
        *lock(&self.config) = config;
    }

    pub fn secrets(&self) -> &SecretsManager {
        &self.secrets
    }

    pub fn local_store(&self) -> &LocalStore {
        &self.local_store
    }

    pub fn navigation(&self) -> &NavigationStore {
        &self.navigation
    }

    pub fn push(&self) -> &PushRegistrar {
        &self.push
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        lock(&self.current_user).clone()
    }

    fn set_user(&self, user: Option<UserProfile>) {
        *lock(&self.current_user) = user;
    }

    /// Comment or answer the open reply form points at.
    pub fn reply_target(&self) -> Option<ReplyTarget> {
        lock(&self.reply).target().cloned()
    }

    pub fn reply_to(&self, target: ReplyTarget) {
        lock(&self.reply).set_target(target);
    }

    pub fn cancel_reply(&self) {
        lock(&self.reply).cancel();
    }

    /// Called when a maintenance or inquiry detail loads. A target picked on
    /// another thread is dropped.
    pub(crate) fn enter_thread(&self, scope: ReplyScope) {
        lock(&self.reply).retain_scope(scope);
    }

    pub(crate) fn reply_parent(&self, scope: ReplyScope) -> Option<i64> {
        lock(&self.reply).parent_id_for(scope)
    }

    pub(crate) fn complete_reply(&self) {
        lock(&self.reply).complete();
    }

    fn portal_config(&self) -> PortalConfig {
        let config = self.config();
        PortalConfig::new(config.api_base_url).with_accept_language(config.accept_language)
    }

    /// Client without credentials, for the login endpoints.
    pub fn anonymous_client(&self) -> Result<PortalClient, String> {
        PortalClient::new(self.portal_config()).map_err(|err| err.to_string())
    }

    /// Client carrying the stored bearer token.
    pub fn authed_client(&self) -> Result<PortalClient, String> {
        let token = self
            .secrets
            .access_token()?
            .ok_or_else(|| SESSION_REQUIRED_MESSAGE.to_string())?;
        PortalClient::new(self.portal_config().with_access_token(token)).map_err(|err| err.to_string())
    }

    pub fn has_session(&self) -> Result<bool, String> {
        Ok(self.secrets.get_session()?.is_some())
    }

    /// Route to render for `route`, sending unauthenticated users to login.
    pub fn guard(&self, route: &str) -> Result<String, String> {
        Ok(guard_route(route, self.has_session()?).to_string())
    }

    /// Maps a backend failure to a user message; a rejected token also ends the session.
    pub fn failure_message(&self, err: &PortalError, fallback: &str) -> String {
        if err.is_authentication() && self.has_session().unwrap_or(false) {
            warn!("Backend rejected the stored token, clearing session");
            self.end_session();
            return SESSION_EXPIRED_MESSAGE.to_string();
        }
        err.user_message(fallback)
    }

    fn end_session(&self) {
        if let Err(err) = self.secrets.clear_session() {
            warn!("Failed to clear stored session: {}", redact_log_details(&err));
        }
        self.set_user(None);
        self.navigation.reset();
        self.cancel_reply();
    }

    fn start_session(&self, access_token: &str, refresh_token: &str, user: Option<UserProfile>) -> Result<(), String> {
        self.secrets.save_session(access_token, Some(refresh_token))?;
        self.set_user(user);
        Ok(())
    }

    pub async fn login(&self, form: LoginForm, query_site_key: Option<&str>) -> Result<AuthOutcome, String> {
        let default_site_key = self.config().site_key;
        let request = forms::validate_login(form, query_site_key, default_site_key.as_deref())?;
        let client = self.anonymous_client()?;
        let response = client
            .login(&request)
            .await
            .map_err(|err| err.user_message(LOGIN_FAILED))?;

        if response.is_first_login {
            info!("First login, password change required");
            self.start_session(&response.access_token, &response.refresh_token, None)?;
            return Ok(AuthOutcome {
                next_route: CHANGE_PASSWORD_ROUTE.to_string(),
                user: None,
            });
        }

        self.start_session(&response.access_token, &response.refresh_token, Some(response.user.clone()))?;
        self.register_push_in_background();
        Ok(AuthOutcome {
            next_route: DASHBOARD_ROUTE.to_string(),
            user: Some(response.user),
        })
    }

    /// Automatic login from `?key=...&login_id=...`.
    pub async fn site_key_login(&self, site_key: &str, login_id: &str) -> Result<AuthOutcome, String> {
        if site_key.trim().is_empty() || login_id.trim().is_empty() {
            return Err(AUTO_LOGIN_FAILED.to_string());
        }
        let request = SiteKeyLoginRequest {
            site_key: site_key.trim().to_string(),
            login_id: login_id.trim().to_string(),
        };
        let response = self
            .anonymous_client()?
            .site_key_login(&request)
            .await
            .map_err(|err| {
                warn!("Site key login failed: {}", redact_log_details(&err.to_string()));
                AUTO_LOGIN_FAILED.to_string()
            })?;

        self.start_session(&response.access_token, &response.refresh_token, Some(response.user.clone()))?;
        self.register_push_in_background();
        Ok(AuthOutcome {
            next_route: DASHBOARD_ROUTE.to_string(),
            user: Some(response.user),
        })
    }

    /// Emailed estimate link: `?token=...&estimate_id=...`.
    pub async fn verify_estimate_link(&self, token: Option<&str>, estimate_id: Option<&str>) -> Result<AuthOutcome, String> {
        let (token, estimate_id) = link_params(token, estimate_id)?;
        let response = self
            .anonymous_client()?
            .verify_estimate_link(token, estimate_id)
            .await
            .map_err(|err| err.user_message(LINK_AUTH_FAILED))?;

        self.start_session(&response.access_token, &response.refresh_token, Some(response.user.clone()))?;
        Ok(AuthOutcome {
            next_route: estimate_route(response.estimate_id),
            user: Some(response.user),
        })
    }

    /// Emailed contract link: `?token=...&contract_id=...`.
    pub async fn verify_contract_link(&self, token: Option<&str>, contract_id: Option<&str>) -> Result<AuthOutcome, String> {
        let (token, contract_id) = link_params(token, contract_id)?;
        let response = self
            .anonymous_client()?
            .verify_contract_link(token, contract_id)
            .await
            .map_err(|err| err.user_message(LINK_AUTH_FAILED))?;

        self.start_session(&response.access_token, &response.refresh_token, Some(response.user.clone()))?;
        let next_route = response
            .estimate_id
            .map(estimate_route)
            .unwrap_or_else(|| ESTIMATES_ROUTE.to_string());
        Ok(AuthOutcome {
            next_route,
            user: Some(response.user),
        })
    }

    /// On success the session ends and the user signs in again with the new password.
    pub async fn change_password(&self, form: ChangePasswordForm) -> Result<AuthOutcome, String> {
        let request = forms::validate_change_password(form)?;
        self.authed_client()?
            .change_password(&request)
            .await
            .map_err(|err| err.user_message(CHANGE_PASSWORD_FAILED))?;

        self.end_session();
        Ok(AuthOutcome {
            next_route: LOGIN_ROUTE.to_string(),
            user: None,
        })
    }

    pub async fn logout(&self) -> Result<AuthOutcome, String> {
        if let Ok(client) = self.authed_client() {
            self.push.unregister(self.push_service.as_ref(), &client).await;
        }
        self.secrets
            .clear_session()
            .map_err(|err| format!("Failed to clear session: {}", err))?;
        self.set_user(None);
        self.navigation.reset();
        self.cancel_reply();
        Ok(AuthOutcome {
            next_route: LOGIN_ROUTE.to_string(),
            user: None,
        })
    }

    /// Fire-and-forget push registration after a login.
    pub fn register_push_in_background(&self) -> JoinHandle<PushState> {
        let context = self.clone();
        tokio::spawn(async move {
            match context.authed_client() {
                Ok(client) => {
                    context
                        .push
                        .request_and_register(context.push_service.as_ref(), &client)
                        .await
                }
                Err(err) => {
                    warn!("Push registration skipped: {}", err);
                    context.push.state()
                }
            }
        })
    }

    /// Re-sends an unconfirmed push token when the authenticated layout mounts.
    pub fn resume_push_in_background(&self) -> JoinHandle<PushState> {
        let context = self.clone();
        tokio::spawn(async move {
            match context.authed_client() {
                Ok(client) => {
                    context
                        .push
                        .resume_pending(context.push_service.as_ref(), &client)
                        .await
                }
                Err(_) => context.push.state(),
            }
        })
    }
}

fn link_params<'a>(token: Option<&'a str>, id: Option<&str>) -> Result<(&'a str, i64), String> {
    let token = token
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| LINK_INVALID.to_string())?;
    let id = id
        .and_then(|value| value.trim().parse::<i64>().ok())
        .ok_or_else(|| LINK_INVALID.to_string())?;
    Ok((token, id))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::push::{TokenDelivery, PUSH_TOKEN_REGISTERED_KEY};
    use async_trait::async_trait;
    use hcms_api::models::PushPlatform;
    use mockito::Matcher;

    /// Push service of a desktop run.
    pub(crate) struct DesktopPush;

    #[async_trait]
    impl PushService for DesktopPush {
        fn is_native(&self) -> bool {
            false
        }

        fn platform(&self) -> Option<PushPlatform> {
            None
        }

        async fn device_id(&self) -> Option<String> {
            None
        }

        async fn request_permission(&self) -> Result<bool, String> {
            Ok(false)
        }

        async fn register(&self) -> Result<TokenDelivery, String> {
            Err("not native".to_string())
        }
    }

    struct MobilePush;

    #[async_trait]
    impl PushService for MobilePush {
        fn is_native(&self) -> bool {
            true
        }

        fn platform(&self) -> Option<PushPlatform> {
            Some(PushPlatform::Ios)
        }

        async fn device_id(&self) -> Option<String> {
            None
        }

        async fn request_permission(&self) -> Result<bool, String> {
            Ok(true)
        }

        async fn register(&self) -> Result<TokenDelivery, String> {
            let (tx, rx) = tokio::sync::oneshot::channel();
            let _ = tx.send(Ok("apns-token".to_string()));
            Ok(rx)
        }
    }

    pub(crate) fn context_for(server: &mockito::ServerGuard) -> AppContext {
        context_with_push(server, Arc::new(DesktopPush))
    }

    fn context_with_push(server: &mockito::ServerGuard, push: Arc<dyn PushService>) -> AppContext {
        let config = Config {
            api_base_url: server.url(),
            site_key: Some("baked-key".to_string()),
            ..Config::default()
        };
        AppContext::new(config, SecretsManager::in_memory(), LocalStore::in_memory(), push)
    }

    const USER: &str = r#"{"seq":3,"login_id":"acme","name":"홍길동","email":null,"company_name":"ACME","company_id":8}"#;

    fn login_body(first: bool) -> String {
        format!(
            r#"{{"access_token":"a1","refresh_token":"r1","is_first_login":{first},"user":{USER}}}"#
        )
    }

    fn form(login_id: &str, password: &str) -> LoginForm {
        LoginForm {
            login_id: login_id.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn login_stores_tokens_and_routes_to_dashboard() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/auth/login")
            .match_body(Matcher::PartialJson(serde_json::json!({"site_key": "baked-key"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(login_body(false))
            .create_async()
            .await;

        let context = context_for(&server);
        let outcome = context.login(form("acme", "secret"), None).await.expect("login");

        mock.assert_async().await;
        assert_eq!(outcome.next_route, DASHBOARD_ROUTE);
        assert_eq!(context.current_user().map(|user| user.seq), Some(3));
        assert_eq!(context.secrets().access_token().expect("read").as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn first_login_routes_to_password_change_without_user() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/auth/login")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(login_body(true))
            .create_async()
            .await;

        let context = context_for(&server);
        let outcome = context.login(form("acme", "secret"), None).await.expect("login");
        assert_eq!(outcome.next_route, CHANGE_PASSWORD_ROUTE);
        assert!(context.current_user().is_none());
        assert!(context.has_session().expect("session"));
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_backend() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/api/auth/login").expect(0).create_async().await;

        let context = context_for(&server);
        let err = context.login(form("a", "secret"), None).await.expect_err("invalid");
        assert_eq!(err, "아이디를 2자 이상 입력해주세요");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn backend_detail_is_shown_on_login_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/auth/login")
            .with_status(400)
            .with_body(r#"{"detail":"아이디 또는 비밀번호가 올바르지 않습니다."}"#)
            .create_async()
            .await;

        let context = context_for(&server);
        let err = context.login(form("acme", "wrong"), None).await.expect_err("rejected");
        assert_eq!(err, "아이디 또는 비밀번호가 올바르지 않습니다.");
        assert!(!context.has_session().expect("session"));
    }

    #[tokio::test]
    async fn estimate_link_requires_both_params() {
        let server = mockito::Server::new_async().await;
        let context = context_for(&server);
        let err = context
            .verify_estimate_link(Some("tok"), None)
            .await
            .expect_err("missing id");
        assert_eq!(err, LINK_INVALID);
    }

    #[tokio::test]
    async fn contract_link_routes_to_linked_estimate() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/estimates/contracts/auth/verify-token")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"access_token":"a","refresh_token":"r","contract_id":5,"estimate_id":12,"user":{USER}}}"#
            ))
            .create_async()
            .await;

        let context = context_for(&server);
        let outcome = context
            .verify_contract_link(Some("tok"), Some("5"))
            .await
            .expect("verified");
        assert_eq!(outcome.next_route, "/estimates/12");
    }

    #[tokio::test]
    async fn change_password_ends_session() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/auth/change-password")
            .match_header("authorization", "Bearer a1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"Password changed successfully"}"#)
            .create_async()
            .await;

        let context = context_for(&server);
        context.secrets().save_session("a1", Some("r1")).expect("save");
        let outcome = context
            .change_password(ChangePasswordForm {
                current_password: "old".into(),
                new_password: "abcd123!".into(),
                confirm_password: "abcd123!".into(),
            })
            .await
            .expect("changed");

        assert_eq!(outcome.next_route, LOGIN_ROUTE);
        assert!(!context.has_session().expect("session"));
    }

    #[tokio::test]
    async fn guard_sends_anonymous_users_to_login() {
        let server = mockito::Server::new_async().await;
        let context = context_for(&server);
        assert_eq!(context.guard("/dashboard").expect("guard"), LOGIN_ROUTE);
        context.secrets().save_session("a1", None).expect("save");
        assert_eq!(context.guard("/dashboard").expect("guard"), "/dashboard");
    }

    #[tokio::test]
    async fn rejected_token_ends_the_session() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/auth/login")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(login_body(false))
            .create_async()
            .await;
        let dashboard = server
            .mock("GET", "/api/dashboard")
            .match_header("authorization", "Bearer a1")
            .with_status(401)
            .with_body(r#"{"detail":"Could not validate credentials"}"#)
            .create_async()
            .await;

        let context = context_for(&server);
        context.login(form("acme", "secret"), None).await.expect("login");
        assert!(context.current_user().is_some());

        let err = crate::portal::dashboard_native(&context)
            .await
            .expect_err("token rejected");

        dashboard.assert_async().await;
        assert_eq!(err, SESSION_EXPIRED_MESSAGE);
        assert!(!context.has_session().expect("session"));
        assert!(context.current_user().is_none());
        assert_eq!(context.guard("/dashboard").expect("guard"), LOGIN_ROUTE);
    }

    #[tokio::test]
    async fn logout_clears_user_and_layout_state() {
        let server = mockito::Server::new_async().await;
        let context = context_for(&server);
        context.secrets().save_session("a1", None).expect("save");
        context.navigation().set_page_title("대시보드");

        let outcome = context.logout().await.expect("logout");
        assert_eq!(outcome.next_route, LOGIN_ROUTE);
        assert!(context.current_user().is_none());
        assert!(context.navigation().snapshot().page_title.is_empty());
        assert!(!context.has_session().expect("session"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn site_key_login_registers_push_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/auth/site-key-login")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(login_body(false))
            .create_async()
            .await;
        let push_mock = server
            .mock("POST", "/api/push/register")
            .match_header("authorization", "Bearer a1")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "token": "apns-token",
                "platform": "ios"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":1,"token":"apns-token","platform":"ios","is_active":true}"#)
            .create_async()
            .await;

        let context = context_with_push(&server, Arc::new(MobilePush));
        context.site_key_login("site-1", "acme").await.expect("login");

        for _ in 0..100 {
            if context.push().state() == PushState::Registered {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }

        assert_eq!(context.push().state(), PushState::Registered);
        push_mock.assert_async().await;
        assert_eq!(
            context.local_store().get(PUSH_TOKEN_REGISTERED_KEY).as_deref(),
            Some("true")
        );
    }
}
