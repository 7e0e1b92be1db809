use std::sync::Arc;

use async_trait::async_trait;
use hcms_api::models::{
    DashboardData, InquiryItem, MaintenanceProjects, NewsDetail, NewsItem, PointUsageData,
    PushPlatform, PushTokenRecord, TaskDetail, UserProfile,
};
use hcms_api::DownloadKind;
use log::{debug, info, warn};
use serde::Deserialize;
use tauri::{Emitter, Manager, Runtime};
use tauri_plugin_dialog::DialogExt;
use tauri_plugin_notification::{NotificationExt, PermissionState};
use tauri_plugin_opener::OpenerExt;
use tokio::sync::oneshot;

use crate::bridge::{
    AuthOutcome, EstimateDetailView, EstimateRow, FilePreview, FileSelectionView,
    InquiryDetailView, ListPage, MaintenanceDetailView, MaintenanceRow, SavedFile, TaskRow, Toast,
};
use crate::config::{Config, ConfigManager};
use crate::forms::{
    ChangePasswordForm, InquiryForm, LoginForm, MaintenanceForm, RevisionForm, TaskForm,
};
use crate::local_store::LocalStore;
use crate::navigation::{Breadcrumb, NavigationState};
use crate::portal;
use crate::push::{PushService, PushState, TokenDelivery, TokenSlot};
use crate::redact_log_details;
use crate::search::{debounced_search, ListState, PointUsageState, SearchInput, SEARCH_DEBOUNCE};
use crate::secrets::{SecretsManager, KEYRING_FALLBACK_SERVICE};
use crate::session::AppContext;
use crate::threads::ReplyTarget;
use crate::uploads::{PickedFile, UploadForm};

const PUSH_REGISTER_EVENT: &str = "push-register";
const SEARCH_APPLIED_EVENT: &str = "search-applied";

/// OS push registration through the native shell.
///
/// `register` asks the native side for a token over an event; the token and
/// device id come back through the `push_token_received` / `push_token_failed`
/// commands.
struct ShellPushService<R: Runtime> {
    app: tauri::AppHandle<R>,
    slot: TokenSlot,
}

#[async_trait]
impl<R: Runtime> PushService for ShellPushService<R> {
    fn is_native(&self) -> bool {
        cfg!(mobile)
    }

    fn platform(&self) -> Option<PushPlatform> {
        if cfg!(target_os = "ios") {
            Some(PushPlatform::Ios)
        } else if cfg!(target_os = "android") {
            Some(PushPlatform::Android)
        } else {
            None
        }
    }

    async fn device_id(&self) -> Option<String> {
        self.slot.device_id()
    }

    async fn request_permission(&self) -> Result<bool, String> {
        let notification = self.app.notification();
        if notification.permission_state().map_err(|err| err.to_string())? == PermissionState::Granted {
            return Ok(true);
        }
        let state = notification
            .request_permission()
            .map_err(|err| err.to_string())?;
        Ok(state == PermissionState::Granted)
    }

    async fn register(&self) -> Result<TokenDelivery, String> {
        let delivery = self.slot.arm();
        self.app
            .emit(PUSH_REGISTER_EVENT, ())
            .map_err(|err| err.to_string())?;
        Ok(delivery)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    search: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    task_type: String,
    #[serde(default)]
    category: String,
}

impl ListParams {
    fn into_state(self) -> ListState {
        let mut state = ListState::default();
        state.apply_search(&self.search);
        state.set_status(&self.status);
        state.set_task_type(&self.task_type);
        state.set_category(&self.category);
        state.go_to_page(self.page.unwrap_or(1));
        state
    }
}

#[derive(Debug, Default, Deserialize)]
struct PointUsageParams {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    project_id: Option<i64>,
    #[serde(default)]
    search_text: String,
    #[serde(default)]
    point_type: String,
    #[serde(default)]
    date_from: String,
    #[serde(default)]
    date_to: String,
}

impl PointUsageParams {
    fn into_state(self) -> Result<PointUsageState, String> {
        let mut state = PointUsageState::default();
        state.select_project(self.project_id);
        state.apply_search(&self.search_text);
        state.set_point_type(&self.point_type);
        state.set_date_range(&self.date_from, &self.date_to)?;
        state.go_to_page(self.page.unwrap_or(1));
        Ok(state)
    }
}

fn log_failure<T>(operation: &str, result: Result<T, String>) -> Result<T, String> {
    if let Err(err) = &result {
        warn!("{} failed", operation);
        debug!("{} details: {}", operation, redact_log_details(err));
    }
    result
}

#[tauri::command]
fn get_config(context: tauri::State<'_, AppContext>) -> Config {
    context.config()
}

#[tauri::command]
fn save_config(
    config: Config,
    context: tauri::State<'_, AppContext>,
    manager: tauri::State<'_, ConfigManager>,
) -> Result<Config, String> {
    let config = config.normalized();
    manager.save(&config).map_err(|err| err.to_string())?;
    context.navigation().set_sidebar_open(config.sidebar_open);
    context.replace_config(config.clone());
    Ok(config)
}

#[tauri::command]
fn has_session(context: tauri::State<'_, AppContext>) -> Result<bool, String> {
    context.has_session()
}

#[tauri::command]
fn guard_route(route: String, context: tauri::State<'_, AppContext>) -> Result<String, String> {
    context.guard(&route)
}

#[tauri::command]
fn get_current_user(context: tauri::State<'_, AppContext>) -> Option<UserProfile> {
    context.current_user()
}

#[tauri::command]
fn get_navigation(context: tauri::State<'_, AppContext>) -> NavigationState {
    context.navigation().snapshot()
}

#[tauri::command]
fn toggle_sidebar(
    context: tauri::State<'_, AppContext>,
    manager: tauri::State<'_, ConfigManager>,
) -> Result<bool, String> {
    let open = context.navigation().toggle_sidebar();
    let mut config = context.config();
    config.sidebar_open = open;
    manager.save(&config).map_err(|err| err.to_string())?;
    context.replace_config(config);
    Ok(open)
}

#[tauri::command]
fn set_page_header(title: String, breadcrumbs: Vec<Breadcrumb>, context: tauri::State<'_, AppContext>) {
    context.navigation().set_page_title(title);
    context.navigation().set_breadcrumbs(breadcrumbs);
}

#[tauri::command]
async fn login(
    form: LoginForm,
    site_key: Option<String>,
    context: tauri::State<'_, AppContext>,
) -> Result<AuthOutcome, String> {
    log_failure("Login", context.login(form, site_key.as_deref()).await)
}

#[tauri::command]
async fn site_key_login(
    key: String,
    login_id: String,
    context: tauri::State<'_, AppContext>,
) -> Result<AuthOutcome, String> {
    log_failure("Site key login", context.site_key_login(&key, &login_id).await)
}

#[tauri::command]
async fn verify_estimate_link(
    token: Option<String>,
    estimate_id: Option<String>,
    context: tauri::State<'_, AppContext>,
) -> Result<AuthOutcome, String> {
    let outcome = context
        .verify_estimate_link(token.as_deref(), estimate_id.as_deref())
        .await;
    log_failure("Estimate link verification", outcome)
}

#[tauri::command]
async fn verify_contract_link(
    token: Option<String>,
    contract_id: Option<String>,
    context: tauri::State<'_, AppContext>,
) -> Result<AuthOutcome, String> {
    let outcome = context
        .verify_contract_link(token.as_deref(), contract_id.as_deref())
        .await;
    log_failure("Contract link verification", outcome)
}

#[tauri::command]
async fn change_password(form: ChangePasswordForm, context: tauri::State<'_, AppContext>) -> Result<AuthOutcome, String> {
    context.change_password(form).await
}

#[tauri::command]
async fn logout(context: tauri::State<'_, AppContext>) -> Result<AuthOutcome, String> {
    context.logout().await
}

#[tauri::command]
async fn resume_push(context: tauri::State<'_, AppContext>) -> Result<PushState, String> {
    context
        .resume_push_in_background()
        .await
        .map_err(|err| err.to_string())
}

#[tauri::command]
fn get_push_state(context: tauri::State<'_, AppContext>) -> PushState {
    context.push().state()
}

/// Called by the native push bridge with the OS token and, when the platform
/// exposes one, a stable device id.
#[tauri::command]
fn push_token_received(token: String, device_id: Option<String>, slot: tauri::State<'_, TokenSlot>) {
    slot.remember_device(device_id);
    if !slot.deliver(Ok(token)) {
        debug!("Push token arrived with no pending request");
    }
}

#[tauri::command]
fn push_token_failed(error: String, slot: tauri::State<'_, TokenSlot>) {
    slot.deliver(Err(error));
}

#[tauri::command]
async fn list_push_tokens(context: tauri::State<'_, AppContext>) -> Result<Vec<PushTokenRecord>, String> {
    portal::list_push_tokens_native(&context).await
}

#[tauri::command]
async fn get_dashboard(context: tauri::State<'_, AppContext>) -> Result<DashboardData, String> {
    portal::dashboard_native(&context).await
}

#[tauri::command]
fn search_input(value: String, input: tauri::State<'_, SearchInput>) {
    input.set(value);
}

#[tauri::command]
async fn list_maintenance(
    params: ListParams,
    context: tauri::State<'_, AppContext>,
) -> Result<ListPage<MaintenanceRow>, String> {
    let state = params.into_state();
    portal::list_maintenance_native(&context, state.query()).await
}

#[tauri::command]
async fn get_maintenance(id: i64, context: tauri::State<'_, AppContext>) -> Result<MaintenanceDetailView, String> {
    portal::maintenance_detail_native(&context, id).await
}

#[tauri::command]
async fn get_maintenance_projects(context: tauri::State<'_, AppContext>) -> Result<MaintenanceProjects, String> {
    portal::maintenance_projects_native(&context).await
}

#[tauri::command]
async fn create_maintenance(
    form: MaintenanceForm,
    files: Vec<String>,
    context: tauri::State<'_, AppContext>,
) -> Result<Toast, String> {
    let files = portal::picked_files(files).await?;
    log_failure(
        "Maintenance request",
        portal::create_maintenance_native(&context, form, files).await,
    )
}

#[tauri::command]
fn reply_to(target: ReplyTarget, context: tauri::State<'_, AppContext>) {
    context.reply_to(target);
}

#[tauri::command]
fn cancel_reply(context: tauri::State<'_, AppContext>) {
    context.cancel_reply();
}

#[tauri::command]
fn get_reply_target(context: tauri::State<'_, AppContext>) -> Option<ReplyTarget> {
    context.reply_target()
}

#[tauri::command]
async fn add_maintenance_comment(
    maintenance_id: i64,
    content: String,
    attachment: Option<String>,
    context: tauri::State<'_, AppContext>,
) -> Result<MaintenanceDetailView, String> {
    let attachment = match attachment {
        Some(path) => Some(PickedFile::from_path(path).await?),
        None => None,
    };
    portal::add_maintenance_comment_native(&context, maintenance_id, content, attachment).await
}

#[tauri::command]
async fn list_news(params: ListParams, context: tauri::State<'_, AppContext>) -> Result<ListPage<NewsItem>, String> {
    let state = params.into_state();
    portal::list_news_native(&context, state.query()).await
}

#[tauri::command]
async fn get_news(id: i64, context: tauri::State<'_, AppContext>) -> Result<NewsDetail, String> {
    portal::news_detail_native(&context, id).await
}

#[tauri::command]
async fn list_tasks(params: ListParams, context: tauri::State<'_, AppContext>) -> Result<ListPage<TaskRow>, String> {
    let state = params.into_state();
    portal::list_tasks_native(&context, state.query()).await
}

#[tauri::command]
async fn get_task(id: i64, context: tauri::State<'_, AppContext>) -> Result<TaskDetail, String> {
    portal::task_detail_native(&context, id).await
}

#[tauri::command]
async fn create_task(form: TaskForm, files: Vec<String>, context: tauri::State<'_, AppContext>) -> Result<Toast, String> {
    let files = portal::picked_files(files).await?;
    log_failure("Task creation", portal::create_task_native(&context, form, files).await)
}

#[tauri::command]
async fn list_estimates(params: ListParams, context: tauri::State<'_, AppContext>) -> Result<ListPage<EstimateRow>, String> {
    let state = params.into_state();
    portal::list_estimates_native(&context, state.query()).await
}

#[tauri::command]
async fn get_estimate(id: i64, context: tauri::State<'_, AppContext>) -> Result<EstimateDetailView, String> {
    portal::estimate_detail_native(&context, id).await
}

#[tauri::command]
async fn approve_estimate(id: i64, context: tauri::State<'_, AppContext>) -> Result<Toast, String> {
    log_failure("Estimate approval", portal::approve_estimate_native(&context, id).await)
}

#[tauri::command]
async fn reject_estimate(id: i64, reason: String, context: tauri::State<'_, AppContext>) -> Result<Toast, String> {
    log_failure("Estimate rejection", portal::reject_estimate_native(&context, id, reason).await)
}

#[tauri::command]
async fn request_estimate_revision(
    id: i64,
    form: RevisionForm,
    context: tauri::State<'_, AppContext>,
) -> Result<Toast, String> {
    log_failure(
        "Estimate revision",
        portal::request_estimate_revision_native(&context, id, form).await,
    )
}

#[tauri::command]
async fn preview_estimate_pdf(
    id: i64,
    contract: bool,
    context: tauri::State<'_, AppContext>,
) -> Result<FilePreview, String> {
    portal::preview_pdf_native(&context, id, contract).await
}

#[tauri::command]
async fn save_estimate_pdf(id: i64, contract: bool, context: tauri::State<'_, AppContext>) -> Result<SavedFile, String> {
    log_failure("PDF download", portal::save_pdf_native(&context, id, contract).await)
}

#[tauri::command]
async fn get_point_usage(
    params: PointUsageParams,
    context: tauri::State<'_, AppContext>,
) -> Result<PointUsageData, String> {
    let state = params.into_state()?;
    portal::point_usage_native(&context, state.query()).await
}

#[tauri::command]
async fn export_point_usage(
    params: PointUsageParams,
    context: tauri::State<'_, AppContext>,
) -> Result<SavedFile, String> {
    let state = params.into_state()?;
    log_failure("Point usage export", portal::save_point_usage_export_native(&context, state.query()).await)
}

#[tauri::command]
async fn list_inquiries(params: ListParams, context: tauri::State<'_, AppContext>) -> Result<ListPage<InquiryItem>, String> {
    let state = params.into_state();
    portal::list_inquiries_native(&context, state.query()).await
}

#[tauri::command]
async fn get_inquiry(id: i64, context: tauri::State<'_, AppContext>) -> Result<InquiryDetailView, String> {
    portal::inquiry_detail_native(&context, id).await
}

#[tauri::command]
async fn create_inquiry(form: InquiryForm, files: Vec<String>, context: tauri::State<'_, AppContext>) -> Result<Toast, String> {
    let files = portal::picked_files(files).await?;
    log_failure("Inquiry creation", portal::create_inquiry_native(&context, form, files).await)
}

#[tauri::command]
async fn add_inquiry_answer(
    inquiry_id: i64,
    content: String,
    context: tauri::State<'_, AppContext>,
) -> Result<InquiryDetailView, String> {
    portal::add_inquiry_answer_native(&context, inquiry_id, content).await
}

#[tauri::command]
async fn select_files(form: UploadForm, existing: Vec<String>, picked: Vec<String>) -> Result<FileSelectionView, String> {
    portal::select_files_native(form, existing, picked).await
}

/// Opens the native picker and merges the choice into `existing`.
#[tauri::command]
async fn pick_files(
    form: UploadForm,
    existing: Vec<String>,
    app: tauri::AppHandle,
) -> Result<FileSelectionView, String> {
    let (tx, rx) = oneshot::channel();
    app.dialog().file().pick_files(move |paths| {
        let _ = tx.send(paths);
    });
    let picked: Vec<String> = rx
        .await
        .map_err(|_| "파일 선택 창이 닫혔습니다.".to_string())?
        .unwrap_or_default()
        .into_iter()
        .filter_map(|path| path.into_path().ok())
        .map(|path| path.display().to_string())
        .collect();
    portal::select_files_native(form, existing, picked).await
}

#[tauri::command]
async fn download_attachment(
    kind: DownloadKind,
    id: i64,
    file_name: Option<String>,
    context: tauri::State<'_, AppContext>,
) -> Result<SavedFile, String> {
    log_failure(
        "Attachment download",
        portal::save_attachment_native(&context, kind, id, file_name).await,
    )
}

#[tauri::command]
fn open_saved_file(path: String, app: tauri::AppHandle) -> Result<(), String> {
    app.opener()
        .open_path(path, None::<&str>)
        .map_err(|err| err.to_string())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .try_init();

    info!("Starting HCMS portal");

    let token_slot = TokenSlot::default();
    let token_slot_for_setup = token_slot.clone();

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_notification::init())
        .plugin(tauri_plugin_dialog::init())
        .manage(token_slot)
        .setup(move |app| {
            let app_handle = app.handle().clone();

            let config_manager = ConfigManager::new()?;
            let config = config_manager.load();
            app.manage(config_manager);

            let secrets = SecretsManager::initialize(&app.config().identifier)
                .or_else(|err| {
                    warn!("Keyring unavailable, keeping the session in memory");
                    debug!("Keyring details: {}", redact_log_details(&err));
                    SecretsManager::initialize(KEYRING_FALLBACK_SERVICE)
                })
                .unwrap_or_else(|_| SecretsManager::in_memory());
            let local_store = LocalStore::open_default()?;
            let push_service: Arc<dyn PushService> = Arc::new(ShellPushService {
                app: app_handle.clone(),
                slot: token_slot_for_setup.clone(),
            });

            let context = AppContext::new(config, secrets, local_store, push_service);
            let startup_context = context.clone();
            app.manage(context);

            tauri::async_runtime::spawn(async move {
                let state = startup_context.resume_push_in_background().await;
                debug!("Startup push resume finished: {:?}", state);
            });

            let search_handle = app_handle.clone();
            let (search_input, mut applied) = tauri::async_runtime::block_on(async {
                debounced_search(SEARCH_DEBOUNCE)
            });
            app.manage(search_input);
            tauri::async_runtime::spawn(async move {
                while let Some(term) = applied.recv().await {
                    if let Err(err) = search_handle.emit(SEARCH_APPLIED_EVENT, &term) {
                        warn!("Failed to emit search event: {}", err);
                    }
                }
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            get_config,
            save_config,
            has_session,
            guard_route,
            get_current_user,
            get_navigation,
            toggle_sidebar,
            set_page_header,
            login,
            site_key_login,
            verify_estimate_link,
            verify_contract_link,
            change_password,
            logout,
            resume_push,
            get_push_state,
            push_token_received,
            push_token_failed,
            list_push_tokens,
            get_dashboard,
            search_input,
            list_maintenance,
            get_maintenance,
            get_maintenance_projects,
            create_maintenance,
            reply_to,
            cancel_reply,
            get_reply_target,
            add_maintenance_comment,
            list_news,
            get_news,
            list_tasks,
            get_task,
            create_task,
            list_estimates,
            get_estimate,
            approve_estimate,
            reject_estimate,
            request_estimate_revision,
            preview_estimate_pdf,
            save_estimate_pdf,
            get_point_usage,
            export_point_usage,
            list_inquiries,
            get_inquiry,
            create_inquiry,
            add_inquiry_answer,
            select_files,
            pick_files,
            download_attachment,
            open_saved_file
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
