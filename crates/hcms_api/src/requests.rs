//! Query-string filters and multipart submissions sent to the portal API.

use chrono::NaiveDate;
use reqwest::multipart::{Form, Part};
use serde::Serialize;

use crate::error::{PortalError, Result};

pub const DEFAULT_PER_PAGE: u32 = 10;
pub const POINT_USAGE_PER_PAGE: u32 = 20;

/// Filters shared by list endpoints. Blank filters are left out of the query string.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub per_page: u32,
    #[serde(skip_serializing_if = "is_blank")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub task_type: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub category: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            search: None,
            status: None,
            task_type: None,
            category: None,
        }
    }
}

impl ListQuery {
    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = Some(task_type.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Filters for `GET /point-usage`.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct PointUsageQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(skip_serializing_if = "is_blank")]
    pub search_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_date")]
    pub date_from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_date")]
    pub date_to: Option<NaiveDate>,
    /// 1 = charge, 2 = usage, 3 = allotment.
    #[serde(skip_serializing_if = "is_blank")]
    pub point_type: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

impl Default for PointUsageQuery {
    fn default() -> Self {
        Self {
            project_id: None,
            search_text: None,
            date_from: None,
            date_to: None,
            point_type: None,
            page: 1,
            per_page: POINT_USAGE_PER_PAGE,
        }
    }
}

impl PointUsageQuery {
    /// The same filters without paging, for the Excel export.
    pub fn export_filters(&self) -> PointUsageExport<'_> {
        PointUsageExport {
            project_id: self.project_id,
            search_text: self.search_text.as_deref().map(str::trim).filter(|text| !text.is_empty()),
            date_from: self.date_from,
            date_to: self.date_to,
            point_type: self.point_type.as_deref().map(str::trim).filter(|kind| !kind.is_empty()),
        }
    }
}

/// Query string of `GET /api/point-usage/export`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PointUsageExport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_date")]
    pub date_from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_date")]
    pub date_to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_type: Option<&'a str>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or_default().is_empty()
}

fn serialize_date<S>(value: &Option<NaiveDate>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Some(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
        None => serializer.serialize_none(),
    }
}

/// File content staged for a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    fn into_part(self) -> Result<Part> {
        Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.mime_type)
            .map_err(|err| PortalError::Other(err.to_string()))
    }
}

fn attach_files(mut form: Form, field: &'static str, files: Vec<FileUpload>) -> Result<Form> {
    for file in files {
        form = form.part(field, file.into_part()?);
    }
    Ok(form)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMaintenanceRequest {
    pub project_id: i64,
    pub title: String,
    /// Rich-text HTML from the editor.
    pub contents: String,
    pub files: Vec<FileUpload>,
}

impl NewMaintenanceRequest {
    pub fn into_form(self) -> Result<Form> {
        let form = Form::new()
            .text("project_id", self.project_id.to_string())
            .text("title", self.title)
            .text("contents", self.contents);
        attach_files(form, "files", self.files)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub task_type: u8,
    pub title: String,
    pub content: String,
    pub files: Vec<FileUpload>,
}

impl NewTask {
    pub fn into_form(self) -> Result<Form> {
        let form = Form::new()
            .text("task_type", self.task_type.to_string())
            .text("title", self.title)
            .text("content", self.content);
        attach_files(form, "files", self.files)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInquiry {
    pub inquiry_type: i32,
    pub title: String,
    pub contents: String,
    pub files: Vec<FileUpload>,
}

impl NewInquiry {
    pub fn into_form(self) -> Result<Form> {
        let form = Form::new()
            .text("title", self.title.trim().to_string())
            .text("contents", self.contents.trim().to_string())
            .text("inquiry_type", self.inquiry_type.to_string());
        attach_files(form, "files", self.files)
    }
}

/// Comment on a maintenance request, optionally replying to another comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub content: String,
    pub parent_id: Option<i64>,
    pub attachment: Option<FileUpload>,
}

impl NewComment {
    pub fn into_form(self) -> Result<Form> {
        let mut form = Form::new().text("content", self.content);
        if let Some(parent_id) = self.parent_id {
            form = form.text("parent_id", parent_id.to_string());
        }
        if let Some(file) = self.attachment {
            form = form.part("attachment", file.into_part()?);
        }
        Ok(form)
    }
}

/// Customer answer on an inquiry, optionally replying to another answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInquiryAnswer {
    pub content: String,
    pub parent_answer_id: Option<i64>,
}

impl NewInquiryAnswer {
    pub fn into_form(self) -> Form {
        let form = Form::new().text("content", self.content);
        match self.parent_answer_id {
            Some(parent) => form.text("parent_answer_id", parent.to_string()),
            None => form,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode<T: Serialize>(value: &T) -> String {
        serde_json::to_string(value).expect("serialize query")
    }

    #[test]
    fn list_query_omits_blank_filters() {
        let query = ListQuery::default().search("   ").status("2");
        let encoded = encode(&query);
        assert_eq!(encoded, r#"{"page":1,"per_page":10,"status":"2"}"#);
    }

    #[test]
    fn page_never_drops_below_one() {
        assert_eq!(ListQuery::default().page(0).page, 1);
    }

    #[test]
    fn point_usage_query_formats_dates() {
        let query = PointUsageQuery {
            date_from: NaiveDate::from_ymd_opt(2025, 3, 1),
            point_type: Some("2".into()),
            ..PointUsageQuery::default()
        };
        let encoded = encode(&query);
        assert!(encoded.contains(r#""date_from":"2025-03-01""#));
        assert!(!encoded.contains("date_to"));
        assert!(encoded.contains(r#""per_page":20"#));
    }

    #[test]
    fn export_filters_drop_paging_and_blank_text() {
        let query = PointUsageQuery {
            project_id: Some(4),
            search_text: Some("  ".into()),
            date_to: NaiveDate::from_ymd_opt(2025, 3, 31),
            page: 3,
            ..PointUsageQuery::default()
        };
        let encoded = encode(&query.export_filters());
        assert_eq!(encoded, r#"{"project_id":4,"date_to":"2025-03-31"}"#);
    }

    #[test]
    fn upload_with_invalid_mime_is_rejected() {
        let upload = FileUpload {
            file_name: "a.txt".into(),
            mime_type: "not a mime".into(),
            bytes: vec![1, 2, 3],
        };
        assert!(upload.into_part().is_err());
    }
}
