//! Portal screens as plain async operations over an [`AppContext`].
//!
//! Every operation returns the DTO the webview renders or the message to show
//! in an error toast. Backend rejections surface their `detail`; anything
//! without one falls back to a per-operation message.

use std::env;
use std::path::{Path, PathBuf};

use base64::prelude::{Engine as _, BASE64_STANDARD};
use directories::UserDirs;
use hcms_api::models::{
    DashboardData, MaintenanceProjects, NewsDetail, NewsItem, PointUsageData, PushTokenRecord,
    RejectRequest, TaskDetail,
};
use hcms_api::{BinaryContent, DownloadKind, FileUpload, ListQuery, PointUsageQuery};
use log::{info, warn};
use tokio::fs as async_fs;

use crate::bridge::{
    EstimateDetailView, EstimateRow, FilePreview, FileSelectionView, InquiryDetailView, ListPage,
    MaintenanceDetailView, MaintenanceRow, SavedFile, TaskRow, Toast,
};
use crate::forms::{self, InquiryForm, MaintenanceForm, RevisionForm, TaskForm};
use crate::session::AppContext;
use crate::threads::ReplyScope;
use crate::uploads::{load_all, select_files, PickedFile, UploadForm};

const LOAD_FAILED: &str = "데이터를 불러오지 못했습니다.";
const CREATE_FAILED: &str = "등록에 실패했습니다.";
const COMMENT_FAILED: &str = "댓글 등록에 실패했습니다.";
const APPROVE_FAILED: &str = "승인 처리에 실패했습니다.";
const REJECT_FAILED: &str = "거절 처리에 실패했습니다.";
const REVISION_FAILED: &str = "수정요청에 실패했습니다.";
const INQUIRY_FAILED: &str = "문의 등록에 실패했습니다.";
const ANSWER_FAILED: &str = "답변 등록에 실패했습니다.";
const PDF_FAILED: &str = "PDF 다운로드에 실패했습니다.";
const FILE_FAILED: &str = "파일 다운로드에 실패했습니다.";
const EXPORT_FAILED: &str = "엑셀 다운로드에 실패했습니다.";
const POINT_USAGE_EXPORT_NAME: &str = "포인트사용내역.xlsx";

pub async fn dashboard_native(context: &AppContext) -> Result<DashboardData, String> {
    let client = context.authed_client()?;
    client
        .get_dashboard()
        .await
        .map_err(|err| context.failure_message(&err, LOAD_FAILED))
}

pub async fn list_maintenance_native(context: &AppContext, query: &ListQuery) -> Result<ListPage<MaintenanceRow>, String> {
    let page = context
        .authed_client()?
        .list_maintenance(query)
        .await
        .map_err(|err| context.failure_message(&err, LOAD_FAILED))?;
    Ok(ListPage::from_paginated(page, MaintenanceRow::from))
}

pub async fn maintenance_detail_native(context: &AppContext, id: i64) -> Result<MaintenanceDetailView, String> {
    let detail = context
        .authed_client()?
        .get_maintenance(id)
        .await
        .map_err(|err| context.failure_message(&err, LOAD_FAILED))?;
    context.enter_thread(ReplyScope::Maintenance(id));
    Ok(MaintenanceDetailView::from(detail))
}

pub async fn maintenance_projects_native(context: &AppContext) -> Result<MaintenanceProjects, String> {
    context
        .authed_client()?
        .get_maintenance_projects()
        .await
        .map_err(|err| context.failure_message(&err, LOAD_FAILED))
}

pub async fn create_maintenance_native(
    context: &AppContext,
    form: MaintenanceForm,
    files: Vec<PickedFile>,
) -> Result<Toast, String> {
    let mut request = forms::validate_maintenance(form, Vec::new())?;
    request.files = attach(UploadForm::Maintenance, files).await?;
    let created = context
        .authed_client()?
        .create_maintenance(request)
        .await
        .map_err(|err| context.failure_message(&err, CREATE_FAILED))?;
    info!("Maintenance request {} created", created.id);
    Ok(Toast::success("유지보수 요청이 등록되었습니다."))
}

/// Posts a comment, as a reply when the reply target belongs to this request.
/// The target is cleared once the reply is accepted.
pub async fn add_maintenance_comment_native(
    context: &AppContext,
    maintenance_id: i64,
    content: String,
    attachment: Option<PickedFile>,
) -> Result<MaintenanceDetailView, String> {
    let parent_id = context.reply_parent(ReplyScope::Maintenance(maintenance_id));
    let mut comment = forms::validate_comment(content, parent_id, None)?;
    comment.attachment = attach(UploadForm::Comment, attachment.into_iter().collect())
        .await?
        .into_iter()
        .next();

    let client = context.authed_client()?;
    client
        .add_maintenance_comment(maintenance_id, comment)
        .await
        .map_err(|err| context.failure_message(&err, COMMENT_FAILED))?;
    if parent_id.is_some() {
        context.complete_reply();
    }

    let detail = client
        .get_maintenance(maintenance_id)
        .await
        .map_err(|err| context.failure_message(&err, LOAD_FAILED))?;
    Ok(MaintenanceDetailView::from(detail))
}

pub async fn list_news_native(context: &AppContext, query: &ListQuery) -> Result<ListPage<NewsItem>, String> {
    let page = context
        .authed_client()?
        .list_news(query)
        .await
        .map_err(|err| context.failure_message(&err, LOAD_FAILED))?;
    Ok(ListPage::from_paginated(page, |item| item))
}

pub async fn news_detail_native(context: &AppContext, id: i64) -> Result<NewsDetail, String> {
    context
        .authed_client()?
        .get_news(id)
        .await
        .map_err(|err| context.failure_message(&err, LOAD_FAILED))
}

pub async fn list_tasks_native(context: &AppContext, query: &ListQuery) -> Result<ListPage<TaskRow>, String> {
    let page = context
        .authed_client()?
        .list_tasks(query)
        .await
        .map_err(|err| context.failure_message(&err, LOAD_FAILED))?;
    Ok(ListPage::from_paginated(page, TaskRow::from))
}

pub async fn task_detail_native(context: &AppContext, id: i64) -> Result<TaskDetail, String> {
    context
        .authed_client()?
        .get_task(id)
        .await
        .map_err(|err| context.failure_message(&err, LOAD_FAILED))
}

pub async fn create_task_native(context: &AppContext, form: TaskForm, files: Vec<PickedFile>) -> Result<Toast, String> {
    let mut task = forms::validate_task(form, Vec::new())?;
    task.files = attach(UploadForm::Task, files).await?;
    let created = context
        .authed_client()?
        .create_task(task)
        .await
        .map_err(|err| context.failure_message(&err, CREATE_FAILED))?;
    info!("Task {} created", created.id);
    Ok(Toast::success("건별작업이 등록되었습니다."))
}

pub async fn list_estimates_native(context: &AppContext, query: &ListQuery) -> Result<ListPage<EstimateRow>, String> {
    let page = context
        .authed_client()?
        .list_estimates(query)
        .await
        .map_err(|err| context.failure_message(&err, LOAD_FAILED))?;
    Ok(ListPage::from_paginated(page, EstimateRow::from))
}

pub async fn estimate_detail_native(context: &AppContext, id: i64) -> Result<EstimateDetailView, String> {
    let detail = context
        .authed_client()?
        .get_estimate(id)
        .await
        .map_err(|err| context.failure_message(&err, LOAD_FAILED))?;
    Ok(EstimateDetailView::from(detail))
}

pub async fn approve_estimate_native(context: &AppContext, id: i64) -> Result<Toast, String> {
    let result = context
        .authed_client()?
        .approve_estimate(id)
        .await
        .map_err(|err| context.failure_message(&err, APPROVE_FAILED))?;
    Ok(Toast::success(result.message))
}

pub async fn reject_estimate_native(context: &AppContext, id: i64, reason: String) -> Result<Toast, String> {
    let request = RejectRequest {
        reason: reason.trim().to_string(),
    };
    let result = context
        .authed_client()?
        .reject_estimate(id, &request)
        .await
        .map_err(|err| context.failure_message(&err, REJECT_FAILED))?;
    Ok(Toast::success(result.message))
}

pub async fn request_estimate_revision_native(context: &AppContext, id: i64, form: RevisionForm) -> Result<Toast, String> {
    let request = forms::validate_revision(form)?;
    let result = context
        .authed_client()?
        .request_estimate_revision(id, &request)
        .await
        .map_err(|err| context.failure_message(&err, REVISION_FAILED))?;
    Ok(Toast::success(result.message))
}

pub async fn point_usage_native(context: &AppContext, query: &PointUsageQuery) -> Result<PointUsageData, String> {
    context
        .authed_client()?
        .get_point_usage(query)
        .await
        .map_err(|err| context.failure_message(&err, LOAD_FAILED))
}

/// Saves the filtered point usage history as an Excel workbook.
pub async fn save_point_usage_export_native(context: &AppContext, query: &PointUsageQuery) -> Result<SavedFile, String> {
    export_point_usage_to(context, query, &download_dir()?).await
}

async fn export_point_usage_to(context: &AppContext, query: &PointUsageQuery, dir: &Path) -> Result<SavedFile, String> {
    let binary = context
        .authed_client()?
        .export_point_usage(query)
        .await
        .map_err(|err| context.failure_message(&err, EXPORT_FAILED))?;
    save_to(dir, POINT_USAGE_EXPORT_NAME, &binary.bytes).await
}

pub async fn list_inquiries_native(
    context: &AppContext,
    query: &ListQuery,
) -> Result<ListPage<hcms_api::models::InquiryItem>, String> {
    let page = context
        .authed_client()?
        .list_inquiries(query)
        .await
        .map_err(|err| context.failure_message(&err, LOAD_FAILED))?;
    Ok(ListPage::from_paginated(page, |item| item))
}

pub async fn inquiry_detail_native(context: &AppContext, id: i64) -> Result<InquiryDetailView, String> {
    let detail = context
        .authed_client()?
        .get_inquiry(id)
        .await
        .map_err(|err| context.failure_message(&err, LOAD_FAILED))?;
    context.enter_thread(ReplyScope::Inquiry(id));
    Ok(InquiryDetailView::from(detail))
}

pub async fn create_inquiry_native(context: &AppContext, form: InquiryForm, files: Vec<PickedFile>) -> Result<Toast, String> {
    let mut inquiry = forms::validate_inquiry(form, Vec::new())?;
    inquiry.files = attach(UploadForm::Inquiry, files).await?;
    let created = context
        .authed_client()?
        .create_inquiry(inquiry)
        .await
        .map_err(|err| context.failure_message(&err, INQUIRY_FAILED))?;
    info!("Inquiry {} created", created.id);
    Ok(Toast::success("문의가 등록되었습니다."))
}

/// Adds an answer, threaded under the reply target when it belongs to this inquiry.
pub async fn add_inquiry_answer_native(context: &AppContext, inquiry_id: i64, content: String) -> Result<InquiryDetailView, String> {
    let parent_answer_id = context.reply_parent(ReplyScope::Inquiry(inquiry_id));
    let answer = forms::validate_answer(content, parent_answer_id)?;
    let client = context.authed_client()?;
    client
        .add_inquiry_answer(inquiry_id, answer)
        .await
        .map_err(|err| context.failure_message(&err, ANSWER_FAILED))?;
    if parent_answer_id.is_some() {
        context.complete_reply();
    }

    let detail = client
        .get_inquiry(inquiry_id)
        .await
        .map_err(|err| context.failure_message(&err, LOAD_FAILED))?;
    Ok(InquiryDetailView::from(detail))
}

pub async fn list_push_tokens_native(context: &AppContext) -> Result<Vec<PushTokenRecord>, String> {
    context
        .authed_client()?
        .list_push_tokens()
        .await
        .map_err(|err| context.failure_message(&err, LOAD_FAILED))
}

/// Inspects newly picked paths and merges them into the current attachment list.
pub async fn select_files_native(form: UploadForm, existing: Vec<String>, picked: Vec<String>) -> Result<FileSelectionView, String> {
    let existing = picked_files(existing).await?;
    let picked = picked_files(picked).await?;
    Ok(select_files(&form.policy(), existing, picked).view())
}

pub async fn picked_files(paths: Vec<String>) -> Result<Vec<PickedFile>, String> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(PickedFile::from_path(path).await?);
    }
    Ok(files)
}

/// Re-applies the form's rules at submit time, then reads the files. A file
/// that no longer passes the rules fails the submission with its toast message.
async fn attach(form: UploadForm, files: Vec<PickedFile>) -> Result<Vec<FileUpload>, String> {
    let selection = select_files(&form.policy(), Vec::new(), files);
    if let Some(toast) = selection.toasts.into_iter().next() {
        warn!("Attachment rejected at submit: {}", toast.message);
        return Err(toast.message);
    }
    load_all(selection.accepted).await
}

fn pdf_request(estimate_id: i64, contract: bool) -> (DownloadKind, String) {
    if contract {
        (DownloadKind::ContractPdf, format!("계약서_{}.pdf", estimate_id))
    } else {
        (DownloadKind::EstimatePdf, format!("견적서_{}.pdf", estimate_id))
    }
}

/// Estimate or contract PDF inline, for the in-app viewer.
pub async fn preview_pdf_native(context: &AppContext, estimate_id: i64, contract: bool) -> Result<FilePreview, String> {
    let (kind, _) = pdf_request(estimate_id, contract);
    let binary = fetch(context, kind, estimate_id, PDF_FAILED).await?;
    Ok(FilePreview {
        mime_type: binary
            .mime_type
            .unwrap_or_else(|| "application/pdf".to_string()),
        data_base64: BASE64_STANDARD.encode(&binary.bytes),
    })
}

pub async fn save_pdf_native(context: &AppContext, estimate_id: i64, contract: bool) -> Result<SavedFile, String> {
    let (kind, file_name) = pdf_request(estimate_id, contract);
    let binary = fetch(context, kind, estimate_id, PDF_FAILED).await?;
    // Fixed names, the backend's Content-Disposition is not used for PDFs.
    save_to(&download_dir()?, &file_name, &binary.bytes).await
}

/// Downloads an attachment into the user's download directory.
pub async fn save_attachment_native(
    context: &AppContext,
    kind: DownloadKind,
    id: i64,
    file_name: Option<String>,
) -> Result<SavedFile, String> {
    let binary = fetch(context, kind, id, FILE_FAILED).await?;
    let file_name = file_name
        .filter(|name| !name.trim().is_empty())
        .or(binary.file_name)
        .unwrap_or_else(|| format!("attachment_{}", id));
    save_to(&download_dir()?, &file_name, &binary.bytes).await
}

async fn fetch(context: &AppContext, kind: DownloadKind, id: i64, fallback: &str) -> Result<BinaryContent, String> {
    context
        .authed_client()?
        .download(kind, id)
        .await
        .map_err(|err| context.failure_message(&err, fallback))
}

fn download_dir() -> Result<PathBuf, String> {
    if let Some(dir) = UserDirs::new().and_then(|dirs| dirs.download_dir().map(Path::to_path_buf)) {
        return Ok(dir);
    }
    env::current_dir().map_err(|err| err.to_string())
}

/// File name with path separators replaced, so a backend name cannot escape `dir`.
fn safe_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "download".to_string(),
        _ => cleaned,
    }
}

async fn save_to(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<SavedFile, String> {
    let file_name = safe_file_name(file_name);
    async_fs::create_dir_all(dir)
        .await
        .map_err(|err| err.to_string())?;
    let path = dir.join(&file_name);
    async_fs::write(&path, bytes)
        .await
        .map_err(|err| err.to_string())?;
    info!("Saved {} bytes to {}", bytes.len(), path.display());
    Ok(SavedFile {
        path: path.display().to_string(),
        file_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::context_for;
    use crate::threads::ReplyTarget;
    use mockito::Matcher;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_path(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        env::temp_dir().join(format!("{}-{}", prefix, nanos))
    }

    const DETAIL: &str = r#"{"id":7,"title":"누수","content":"<p>천장</p>","status":"3","request_date":"2025-02-01","worker_type":null,"worker_name":null,"project_title":"본관","comments":[
        {"id":1,"author":"고객","role":"customer","content":"언제 오시나요","created_at":"2025-02-01"},
        {"id":2,"author":"담당자","role":"manager","content":"내일 방문","created_at":"2025-02-02","parent_id":1}
    ]}"#;

    #[tokio::test]
    async fn operations_require_a_session() {
        let server = mockito::Server::new_async().await;
        let context = context_for(&server);
        let err = dashboard_native(&context).await.expect_err("no session");
        assert_eq!(err, crate::session::SESSION_REQUIRED_MESSAGE);
    }

    #[tokio::test]
    async fn maintenance_list_is_labelled() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/maintenance")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "2".into()),
                Matcher::UrlEncoded("search".into(), "누수".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"items":[{"id":7,"title":"누수","status":"3","request_date":"2025-02-01","project_title":null}],"total":11,"page":2,"per_page":10,"total_pages":2}"#)
            .create_async()
            .await;

        let context = context_for(&server);
        context.secrets().save_session("a1", None).expect("save");
        let query = ListQuery::default().page(2).search("누수");
        let page = list_maintenance_native(&context, &query).await.expect("list");

        assert_eq!(page.items[0].status_label, "처리중");
        assert!(page.items[0].in_progress);
        assert!(page.has_previous);
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn reply_is_posted_under_target_and_cleared() {
        let mut server = mockito::Server::new_async().await;
        let post = server
            .mock("POST", "/api/maintenance/7/comments")
            .match_body(Matcher::Regex(r#"name="parent_id"\r\n\r\n1\r\n"#.into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":2,"message":"ok"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/maintenance/7")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(DETAIL)
            .create_async()
            .await;

        let context = context_for(&server);
        context.secrets().save_session("a1", None).expect("save");
        context.reply_to(ReplyTarget {
            scope: ReplyScope::Maintenance(7),
            id: 1,
            author: "고객".into(),
        });

        let view = add_maintenance_comment_native(&context, 7, "내일 방문".into(), None)
            .await
            .expect("comment");

        post.assert_async().await;
        assert!(context.reply_target().is_none());
        assert_eq!(view.comments[1].depth, 1);
        assert_eq!(view.comments[1].indent_px, 20);
    }

    #[tokio::test]
    async fn failed_reply_keeps_target() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/maintenance/7/comments")
            .with_status(400)
            .with_body(r#"{"detail":"종료된 요청입니다."}"#)
            .create_async()
            .await;

        let context = context_for(&server);
        context.secrets().save_session("a1", None).expect("save");
        context.reply_to(ReplyTarget {
            scope: ReplyScope::Maintenance(7),
            id: 1,
            author: "고객".into(),
        });

        let err = add_maintenance_comment_native(&context, 7, "추가".into(), None)
            .await
            .expect_err("rejected");
        assert_eq!(err, "종료된 요청입니다.");
        assert_eq!(context.reply_target().map(|target| target.id), Some(1));
    }

    const INQUIRY: &str = r#"{"id":42,"title":"결제 문의","content":"영수증","status":0,"status_label":"대기","inquiry_type":1,"inquiry_type_label":"일반","priority":"normal","created_at":"2025-03-01","updated_at":"2025-03-01","writer_name":"고객","answers":[]}"#;

    #[tokio::test]
    async fn reply_target_from_another_thread_is_not_attached() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/maintenance/9")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(DETAIL.replacen(r#""id":7"#, r#""id":9"#, 1))
            .create_async()
            .await;
        let top_level = server
            .mock("POST", "/api/inquiries/42/answers")
            .match_request(|request| {
                request
                    .utf8_lossy_body()
                    .map(|body| body.contains(r#"name="content""#) && !body.contains("parent_answer_id"))
                    .unwrap_or(false)
            })
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":3,"message":"ok"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/inquiries/42")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(INQUIRY)
            .create_async()
            .await;

        let context = context_for(&server);
        context.secrets().save_session("a1", None).expect("save");
        context.reply_to(ReplyTarget {
            scope: ReplyScope::Maintenance(5),
            id: 5,
            author: "고객".into(),
        });

        maintenance_detail_native(&context, 9).await.expect("detail");
        assert!(context.reply_target().is_none());

        context.reply_to(ReplyTarget {
            scope: ReplyScope::Maintenance(9),
            id: 1,
            author: "고객".into(),
        });
        add_inquiry_answer_native(&context, 42, "확인 부탁드립니다".into())
            .await
            .expect("answer");

        top_level.assert_async().await;
        assert_eq!(context.reply_target().map(|target| target.id), Some(1));
    }

    #[tokio::test]
    async fn invalid_task_is_not_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/api/tasks").expect(0).create_async().await;

        let context = context_for(&server);
        context.secrets().save_session("a1", None).expect("save");
        let form = TaskForm {
            task_type: None,
            title: "배너".into(),
            content: "교체".into(),
        };
        let err = create_task_native(&context, form, Vec::new()).await.expect_err("invalid");
        assert_eq!(err, "작업 유형을 선택해주세요.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn task_with_blocked_attachment_is_not_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/api/tasks").expect(0).create_async().await;

        let dir = unique_path("hcms-submit");
        async_fs::create_dir_all(&dir).await.expect("dir");
        let allowed = dir.join("plan.pdf");
        let blocked = dir.join("setup.exe");
        async_fs::write(&allowed, b"pdf").await.expect("write");
        async_fs::write(&blocked, b"exe").await.expect("write");
        let files = picked_files(vec![allowed.display().to_string(), blocked.display().to_string()])
            .await
            .expect("picked");

        let context = context_for(&server);
        context.secrets().save_session("a1", None).expect("save");
        let form = TaskForm {
            task_type: Some(1),
            title: "배너".into(),
            content: "교체".into(),
        };
        let err = create_task_native(&context, form, files).await.expect_err("blocked file");

        assert_eq!(err, "setup.exe은(는) 허용되지 않는 파일 형식입니다.");
        mock.assert_async().await;
        let _ = async_fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn approve_without_detail_uses_fallback() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/estimates/3/approve")
            .with_status(500)
            .with_body("internal error")
            .create_async()
            .await;

        let context = context_for(&server);
        context.secrets().save_session("a1", None).expect("save");
        let err = approve_estimate_native(&context, 3).await.expect_err("failed");
        assert_eq!(err, APPROVE_FAILED);
    }

    #[tokio::test]
    async fn point_usage_export_is_saved_as_workbook() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/point-usage/export")
            .match_query(Matcher::UrlEncoded("search_text".into(), "청소".into()))
            .with_status(200)
            .with_body(b"PK".to_vec())
            .create_async()
            .await;

        let context = context_for(&server);
        context.secrets().save_session("a1", None).expect("save");
        let dir = unique_path("hcms-export");
        let query = PointUsageQuery {
            search_text: Some("청소".into()),
            ..PointUsageQuery::default()
        };
        let saved = export_point_usage_to(&context, &query, &dir).await.expect("export");

        assert_eq!(saved.file_name, POINT_USAGE_EXPORT_NAME);
        let bytes = async_fs::read(&saved.path).await.expect("read back");
        assert_eq!(bytes, b"PK");
        let _ = async_fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn failed_export_uses_fallback() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/point-usage/export")
            .with_status(500)
            .create_async()
            .await;

        let context = context_for(&server);
        context.secrets().save_session("a1", None).expect("save");
        let dir = unique_path("hcms-export-failed");
        let err = export_point_usage_to(&context, &PointUsageQuery::default(), &dir)
            .await
            .expect_err("failed");
        assert_eq!(err, EXPORT_FAILED);
    }

    #[test]
    fn pdf_names_follow_document_kind() {
        assert_eq!(pdf_request(12, false), (DownloadKind::EstimatePdf, "견적서_12.pdf".to_string()));
        assert_eq!(pdf_request(12, true), (DownloadKind::ContractPdf, "계약서_12.pdf".to_string()));
    }

    #[test]
    fn file_names_cannot_leave_download_dir() {
        assert_eq!(safe_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(safe_file_name(".."), "download");
        assert_eq!(safe_file_name(" 보고서.pdf "), "보고서.pdf");
    }

    #[tokio::test]
    async fn save_to_writes_into_directory() {
        let dir = unique_path("hcms-download");
        let saved = save_to(&dir, "견적서_1.pdf", b"%PDF-1.4").await.expect("saved");
        assert_eq!(saved.file_name, "견적서_1.pdf");
        let bytes = async_fs::read(&saved.path).await.expect("read back");
        assert_eq!(bytes, b"%PDF-1.4");
        let _ = async_fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn file_pick_applies_form_rules() {
        let dir = unique_path("hcms-pick");
        async_fs::create_dir_all(&dir).await.expect("dir");
        let allowed = dir.join("plan.pdf");
        let blocked = dir.join("setup.exe");
        async_fs::write(&allowed, b"pdf").await.expect("write");
        async_fs::write(&blocked, b"exe").await.expect("write");

        let view = select_files_native(
            UploadForm::Task,
            Vec::new(),
            vec![allowed.display().to_string(), blocked.display().to_string()],
        )
        .await
        .expect("selection");

        assert_eq!(view.accepted.len(), 1);
        assert_eq!(view.accepted[0].name, "plan.pdf");
        assert_eq!(view.accepted[0].path.as_deref(), Some(allowed.display().to_string().as_str()));
        assert_eq!(view.toasts.len(), 1);
        let _ = async_fs::remove_dir_all(&dir).await;
    }
}
