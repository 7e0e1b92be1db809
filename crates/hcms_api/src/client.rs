use crate::config::PortalConfig;
use crate::error::{PortalError, Result};
use crate::models::{
    ActionResult, Created, DashboardData, EstimateDetail, EstimateItem, InquiryDetail, InquiryItem,
    MaintenanceDetail, MaintenanceItem, MaintenanceProjects, MessageResponse, NewsDetail, NewsItem,
    Paginated, PointUsageData, PushTokenRecord, PushTokenRegistration, RejectRequest,
    RevisionRequest, TaskDetail, TaskItem,
};
use crate::requests::{
    ListQuery, NewComment, NewInquiry, NewInquiryAnswer, NewMaintenanceRequest, NewTask,
    PointUsageQuery,
};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE,
    USER_AGENT,
};
use reqwest::multipart::Form;
use reqwest::{Client as HttpClient, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Attachment endpoints that stream a file back with the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadKind {
    MaintenanceAttachment,
    CommentAttachment,
    /// Single file stored directly on an older comment.
    LegacyCommentFile,
    InquiryAttachment,
    EstimatePdf,
    ContractPdf,
}

impl DownloadKind {
    pub fn path(&self, id: i64) -> String {
        match self {
            DownloadKind::MaintenanceAttachment => format!("maintenance/attachments/{}/download", id),
            DownloadKind::CommentAttachment => {
                format!("maintenance/comments/attachments/{}/download", id)
            }
            DownloadKind::LegacyCommentFile => format!("maintenance/comments/{}/file/download", id),
            DownloadKind::InquiryAttachment => format!("inquiries/attachments/{}/download", id),
            DownloadKind::EstimatePdf => format!("estimates/{}/pdf", id),
            DownloadKind::ContractPdf => format!("estimates/{}/contract-pdf", id),
        }
    }
}

#[derive(Clone)]
pub struct PortalClient {
    http: HttpClient,
    config: PortalConfig,
}

impl PortalClient {
    pub fn new(config: PortalConfig) -> Result<Self> {
        let http = build_http_client(&config)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Returns a client for the same backend that authenticates with `token`.
    pub fn with_access_token(&self, token: impl Into<String>) -> Result<Self> {
        Self::new(self.config.clone().with_access_token(token))
    }

    pub fn has_access_token(&self) -> bool {
        self.config
            .access_token
            .as_deref()
            .map(|token| !token.trim().is_empty())
            .unwrap_or(false)
    }

    pub async fn get<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.send_with_body(Method::GET, path, Option::<&Value>::None).await
    }

    pub async fn get_with_query<Q, T>(&self, path: &str, query: &Q) -> Result<T>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(path, "portal GET with query");
        let response = self.http.get(self.url_for(path)).query(query).send().await?;
        Self::parse_json(response).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_with_body(Method::POST, path, Some(body)).await
    }

    /// POST without a request body.
    pub async fn post_empty<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.send_with_body(Method::POST, path, Option::<&Value>::None).await
    }

    pub async fn post_multipart<T>(&self, path: &str, form: Form) -> Result<T>
    where
        T: DeserializeOwned,
    {
        debug!(path, "portal multipart POST");
        let response = self.http.post(self.url_for(path)).multipart(form).send().await?;
        Self::parse_json(response).await
    }

    pub async fn delete_with_body<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_with_body(Method::DELETE, path, Some(body)).await
    }

    pub async fn send_with_body<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(%method, path, "portal request");
        let url = self.url_for(path);
        let mut request = self.http.request(method, url);
        if let Some(payload) = body {
            request = request.json(payload);
        }
        let response = request.send().await?;
        Self::parse_json(response).await
    }

    fn url_for(&self, path: &str) -> String {
        let mut base = self.config.api_root();
        let trimmed = path.trim_start_matches('/');
        base.push_str(trimmed);
        base
    }

    async fn parse_json<T>(response: Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = Self::check_status(response).await?;
        response.json::<T>().await.map_err(PortalError::from)
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            Err(PortalError::access_denied(status, &body))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(PortalError::http(status, body))
        }
    }

    pub async fn fetch_binary(&self, path: &str) -> Result<BinaryContent> {
        debug!(path, "portal download");
        let response = self.http.get(self.url_for(path)).send().await?;
        Self::read_binary(response).await
    }

    pub async fn fetch_binary_with_query<Q>(&self, path: &str, query: &Q) -> Result<BinaryContent>
    where
        Q: Serialize + ?Sized,
    {
        debug!(path, "portal download with query");
        let response = self.http.get(self.url_for(path)).query(query).send().await?;
        Self::read_binary(response).await
    }

    async fn read_binary(response: Response) -> Result<BinaryContent> {
        let response = Self::check_status(response).await?;
        let headers = response.headers();
        let mime_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let file_name = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(disposition_file_name);
        let bytes = response.bytes().await?.to_vec();
        Ok(BinaryContent {
            bytes,
            mime_type,
            file_name,
        })
    }

    pub async fn download(&self, kind: DownloadKind, id: i64) -> Result<BinaryContent> {
        self.fetch_binary(&kind.path(id)).await
    }

    pub async fn get_dashboard(&self) -> Result<DashboardData> {
        self.get("dashboard").await
    }

    pub async fn list_maintenance(&self, query: &ListQuery) -> Result<Paginated<MaintenanceItem>> {
        self.get_with_query("maintenance", query).await
    }

    pub async fn get_maintenance(&self, id: i64) -> Result<MaintenanceDetail> {
        self.get(&format!("maintenance/{}", id)).await
    }

    pub async fn get_maintenance_projects(&self) -> Result<MaintenanceProjects> {
        self.get("maintenance/projects").await
    }

    pub async fn create_maintenance(&self, request: NewMaintenanceRequest) -> Result<Created> {
        self.post_multipart("maintenance", request.into_form()?).await
    }

    pub async fn add_maintenance_comment(&self, maintenance_id: i64, comment: NewComment) -> Result<Created> {
        let path = format!("maintenance/{}/comments", maintenance_id);
        self.post_multipart(&path, comment.into_form()?).await
    }

    pub async fn list_news(&self, query: &ListQuery) -> Result<Paginated<NewsItem>> {
        self.get_with_query("news", query).await
    }

    pub async fn get_news(&self, id: i64) -> Result<NewsDetail> {
        self.get(&format!("news/{}", id)).await
    }

    pub async fn list_tasks(&self, query: &ListQuery) -> Result<Paginated<TaskItem>> {
        self.get_with_query("tasks", query).await
    }

    pub async fn get_task(&self, id: i64) -> Result<TaskDetail> {
        self.get(&format!("tasks/{}", id)).await
    }

    pub async fn create_task(&self, task: NewTask) -> Result<Created> {
        self.post_multipart("tasks", task.into_form()?).await
    }

    pub async fn list_estimates(&self, query: &ListQuery) -> Result<Paginated<EstimateItem>> {
        self.get_with_query("estimates", query).await
    }

    pub async fn get_estimate(&self, id: i64) -> Result<EstimateDetail> {
        self.get(&format!("estimates/{}", id)).await
    }

    pub async fn approve_estimate(&self, id: i64) -> Result<ActionResult> {
        self.post_empty(&format!("estimates/{}/approve", id)).await
    }

    pub async fn reject_estimate(&self, id: i64, request: &RejectRequest) -> Result<ActionResult> {
        self.post(&format!("estimates/{}/reject", id), request).await
    }

    pub async fn request_estimate_revision(&self, id: i64, request: &RevisionRequest) -> Result<ActionResult> {
        self.post(&format!("estimates/{}/revision", id), request).await
    }

    pub async fn get_point_usage(&self, query: &PointUsageQuery) -> Result<PointUsageData> {
        self.get_with_query("point-usage", query).await
    }

    /// Point usage history as an `.xlsx` workbook, filtered like the list but unpaged.
    pub async fn export_point_usage(&self, query: &PointUsageQuery) -> Result<BinaryContent> {
        self.fetch_binary_with_query("point-usage/export", &query.export_filters()).await
    }

    pub async fn list_inquiries(&self, query: &ListQuery) -> Result<Paginated<InquiryItem>> {
        self.get_with_query("inquiries", query).await
    }

    pub async fn get_inquiry(&self, id: i64) -> Result<InquiryDetail> {
        self.get(&format!("inquiries/{}", id)).await
    }

    pub async fn create_inquiry(&self, inquiry: NewInquiry) -> Result<Created> {
        self.post_multipart("inquiries", inquiry.into_form()?).await
    }

    pub async fn add_inquiry_answer(&self, inquiry_id: i64, answer: NewInquiryAnswer) -> Result<Created> {
        let path = format!("inquiries/{}/answers", inquiry_id);
        self.post_multipart(&path, answer.into_form()).await
    }

    pub async fn register_push_token(&self, registration: &PushTokenRegistration) -> Result<PushTokenRecord> {
        self.post("push/register", registration).await
    }

    pub async fn unregister_push_token(&self, registration: &PushTokenRegistration) -> Result<MessageResponse> {
        self.delete_with_body("push/unregister", registration).await
    }

    pub async fn list_push_tokens(&self) -> Result<Vec<PushTokenRecord>> {
        self.get("push/tokens").await
    }
}

fn build_http_client(config: &PortalConfig) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();

    if let Some(token) = config
        .access_token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
    {
        let mut auth_value = header_value(format!("Bearer {}", token))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
    }

    if let Some(language) = &config.accept_language {
        headers.insert(ACCEPT_LANGUAGE, header_value(language.clone())?);
    }

    headers.insert(USER_AGENT, header_value(config.user_agent.clone())?);

    HttpClient::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .build()
        .map_err(|err| PortalError::Other(err.to_string()))
}

fn header_value(value: String) -> Result<HeaderValue> {
    HeaderValue::from_str(&value).map_err(|err| PortalError::Other(err.to_string()))
}

/// Plain `filename=` from a Content-Disposition header; RFC 5987 `filename*` values are ignored.
fn disposition_file_name(value: &str) -> Option<String> {
    value
        .split(';')
        .map(str::trim)
        .find_map(|segment| segment.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

#[derive(Debug, Clone)]
pub struct BinaryContent {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
    pub file_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PushPlatform;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> PortalClient {
        let config = PortalConfig::new(server.url()).with_access_token("access-123");
        PortalClient::new(config).expect("client")
    }

    #[tokio::test]
    async fn list_maintenance_sends_bearer_and_filters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/maintenance")
            .match_header("authorization", "Bearer access-123")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "2".into()),
                Matcher::UrlEncoded("per_page".into(), "10".into()),
                Matcher::UrlEncoded("search".into(), "누수".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"items":[{"id":7,"title":"누수 점검","status":"3","request_date":"2025-01-02","project_title":null,"comments_count":2}],"total":11,"page":2,"per_page":10,"total_pages":2}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let page = client
            .list_maintenance(&ListQuery::default().page(2).search("누수"))
            .await
            .expect("list");

        mock.assert_async().await;
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].comments_count, 2);
        assert!(!page.has_next());
        assert!(page.has_previous());
    }

    #[tokio::test]
    async fn backend_detail_is_preserved_on_rejection() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/estimates/5/approve")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail":"이미 승인된 견적서입니다."}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.approve_estimate(5).await.expect_err("should fail");
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(err.detail(), Some("이미 승인된 견적서입니다."));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_authentication_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/dashboard")
            .with_status(401)
            .with_body(r#"{"detail":"Could not validate credentials"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.get_dashboard().await.expect_err("should fail");
        assert!(err.is_authentication());
    }

    #[tokio::test]
    async fn comment_reply_is_posted_as_multipart_with_parent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/maintenance/12/comments")
            .match_header("content-type", Matcher::Regex("^multipart/form-data".into()))
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="content"\s+확인 부탁드립니다"#.into()),
                Matcher::Regex(r#"name="parent_id"\s+7"#.into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":99,"message":"Comment added successfully"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let created = client
            .add_maintenance_comment(
                12,
                NewComment {
                    content: "확인 부탁드립니다".into(),
                    parent_id: Some(7),
                    attachment: None,
                },
            )
            .await
            .expect("comment");

        mock.assert_async().await;
        assert_eq!(created.id, 99);
    }

    #[tokio::test]
    async fn push_registration_posts_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/push/register")
            .match_body(Matcher::Json(serde_json::json!({
                "token": "fcm-token",
                "platform": "android",
                "device_id": "device-1"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":1,"token":"fcm-token","platform":"android","is_active":true}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let record = client
            .register_push_token(&PushTokenRegistration {
                token: "fcm-token".into(),
                platform: PushPlatform::Android,
                device_id: Some("device-1".into()),
            })
            .await
            .expect("register");

        mock.assert_async().await;
        assert!(record.is_active);
    }

    #[tokio::test]
    async fn download_reads_mime_and_file_name() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/estimates/3/contract-pdf")
            .match_header("authorization", "Bearer access-123")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_header("content-disposition", "attachment; filename=contract_3.pdf")
            .with_body(b"%PDF-1.4".to_vec())
            .create_async()
            .await;

        let client = client_for(&server);
        let content = client.download(DownloadKind::ContractPdf, 3).await.expect("download");
        assert_eq!(content.mime_type.as_deref(), Some("application/pdf"));
        assert_eq!(content.file_name.as_deref(), Some("contract_3.pdf"));
        assert_eq!(content.bytes, b"%PDF-1.4".to_vec());
    }

    #[tokio::test]
    async fn point_usage_export_sends_filters_without_paging() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/point-usage/export")
            .match_header("authorization", "Bearer access-123")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("project_id".into(), "4".into()),
                Matcher::UrlEncoded("date_from".into(), "2025-03-01".into()),
                Matcher::UrlEncoded("point_type".into(), "2".into()),
            ]))
            .match_request(|request| !request.path_and_query().contains("page"))
            .with_status(200)
            .with_header(
                "content-type",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            )
            .with_body(b"PK\x03\x04".to_vec())
            .create_async()
            .await;

        let client = client_for(&server);
        let query = PointUsageQuery {
            project_id: Some(4),
            date_from: chrono::NaiveDate::from_ymd_opt(2025, 3, 1),
            point_type: Some("2".into()),
            page: 2,
            ..PointUsageQuery::default()
        };
        let content = client.export_point_usage(&query).await.expect("export");

        mock.assert_async().await;
        assert_eq!(content.bytes, b"PK\x03\x04".to_vec());
    }

    #[test]
    fn download_paths_match_backend_routes() {
        assert_eq!(
            DownloadKind::CommentAttachment.path(4),
            "maintenance/comments/attachments/4/download"
        );
        assert_eq!(DownloadKind::LegacyCommentFile.path(4), "maintenance/comments/4/file/download");
        assert_eq!(DownloadKind::EstimatePdf.path(9), "estimates/9/pdf");
    }

    #[test]
    fn disposition_parser_handles_quotes_and_missing_names() {
        assert_eq!(
            disposition_file_name(r#"attachment; filename="report.xlsx""#).as_deref(),
            Some("report.xlsx")
        );
        assert_eq!(disposition_file_name("inline"), None);
    }
}
