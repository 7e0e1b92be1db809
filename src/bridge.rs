//! Webview-facing DTOs and conversion helpers.
//!
//! Commands return these shapes; the webview renders them without further
//! lookups (labels, indentation and action flags are resolved here).

use hcms_api::models::{
    Attachment, CommentRole, EstimateDetail, EstimateItem, InquiryAnswer, InquiryDetail,
    MaintenanceComment, MaintenanceDetail, MaintenanceItem, Paginated, TaskItem, UserProfile,
};
use serde::{Deserialize, Serialize};

use crate::status;
use crate::threads::{build_comment_tree, flatten_thread};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

/// Transient message shown to the user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Warning,
            message: message.into(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> ListPage<T> {
    pub fn from_paginated<S>(page: Paginated<S>, convert: impl FnMut(S) -> T) -> Self {
        let has_next = page.has_next();
        let has_previous = page.has_previous();
        ListPage {
            items: page.items.into_iter().map(convert).collect(),
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            total_pages: page.total_pages,
            has_next,
            has_previous,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MaintenanceRow {
    pub id: i64,
    pub title: String,
    pub status: String,
    pub status_label: String,
    pub in_progress: bool,
    pub request_date: String,
    pub project_title: Option<String>,
    pub comments_count: u32,
}

impl From<MaintenanceItem> for MaintenanceRow {
    fn from(item: MaintenanceItem) -> Self {
        MaintenanceRow {
            status_label: status::maintenance_status_label(&item.status).to_string(),
            in_progress: status::maintenance_in_progress(&item.status),
            id: item.id,
            title: item.title,
            status: item.status,
            request_date: item.request_date,
            project_title: item.project_title,
            comments_count: item.comments_count,
        }
    }
}

/// Comment flattened for display with its reply depth.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CommentRow {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub author: String,
    pub role: CommentRole,
    pub content: String,
    pub created_at: String,
    pub worker_type: Option<String>,
    pub attachment: Option<String>,
    pub attachments: Vec<Attachment>,
    pub depth: usize,
    pub indent_px: u32,
}

pub fn comment_rows(comments: Vec<MaintenanceComment>) -> Vec<CommentRow> {
    let tree = build_comment_tree(comments);
    flatten_thread(&tree)
        .into_iter()
        .map(|row| {
            let comment = row.item;
            CommentRow {
                id: comment.id,
                parent_id: comment.parent_id,
                author: comment.author.clone(),
                role: comment.role,
                content: comment.content.clone(),
                created_at: comment.created_at.clone(),
                worker_type: comment.worker_type.clone(),
                attachment: comment.attachment.clone(),
                attachments: comment.attachments.clone(),
                depth: row.depth,
                indent_px: row.indent_px,
            }
        })
        .collect()
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MaintenanceDetailView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub status: String,
    pub status_label: String,
    pub request_date: String,
    pub worker_type: Option<String>,
    pub worker_name: Option<String>,
    pub used_points: i64,
    pub project_title: Option<String>,
    pub attachments: Vec<Attachment>,
    pub comments: Vec<CommentRow>,
}

impl From<MaintenanceDetail> for MaintenanceDetailView {
    fn from(detail: MaintenanceDetail) -> Self {
        MaintenanceDetailView {
            status_label: status::maintenance_status_label(&detail.status).to_string(),
            comments: comment_rows(detail.comments),
            id: detail.id,
            title: detail.title,
            content: detail.content,
            status: detail.status,
            request_date: detail.request_date,
            worker_type: detail.worker_type,
            worker_name: detail.worker_name,
            used_points: detail.used_points,
            project_title: detail.project_title,
            attachments: detail.attachments,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AnswerRow {
    pub id: i64,
    pub parent_answer_id: Option<i64>,
    pub author: String,
    pub role: String,
    pub content: String,
    pub created_at: String,
    pub depth: usize,
    pub indent_px: u32,
}

pub fn answer_rows(answers: Vec<InquiryAnswer>) -> Vec<AnswerRow> {
    let tree = build_comment_tree(answers);
    flatten_thread(&tree)
        .into_iter()
        .map(|row| AnswerRow {
            id: row.item.id,
            parent_answer_id: row.item.parent_answer_id,
            author: row.item.author.clone(),
            role: row.item.role.clone(),
            content: row.item.content.clone(),
            created_at: row.item.created_at.clone(),
            depth: row.depth,
            indent_px: row.indent_px,
        })
        .collect()
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct InquiryDetailView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub status: i32,
    pub status_label: String,
    pub inquiry_type: i32,
    pub inquiry_type_label: String,
    pub priority: String,
    pub created_at: String,
    pub updated_at: String,
    pub writer_name: String,
    pub attachments: Vec<Attachment>,
    pub answers: Vec<AnswerRow>,
}

impl From<InquiryDetail> for InquiryDetailView {
    fn from(detail: InquiryDetail) -> Self {
        InquiryDetailView {
            answers: answer_rows(detail.answers),
            id: detail.id,
            title: detail.title,
            content: detail.content,
            status: detail.status,
            status_label: detail.status_label,
            inquiry_type: detail.inquiry_type,
            inquiry_type_label: detail.inquiry_type_label,
            priority: detail.priority,
            created_at: detail.created_at,
            updated_at: detail.updated_at,
            writer_name: detail.writer_name,
            attachments: detail.attachments,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TaskRow {
    pub id: i64,
    pub title: String,
    pub task_type: String,
    pub task_type_label: String,
    pub status: String,
    pub status_label: String,
    pub in_progress: bool,
    pub created_at: String,
    pub deadline: Option<String>,
}

impl From<TaskItem> for TaskRow {
    fn from(item: TaskItem) -> Self {
        TaskRow {
            status_label: status::task_status_label(&item.status).to_string(),
            in_progress: status::task_in_progress(&item.status),
            id: item.id,
            title: item.title,
            task_type: item.task_type,
            task_type_label: item.task_type_label,
            status: item.status,
            created_at: item.created_at,
            deadline: item.deadline,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EstimateRow {
    pub id: i64,
    pub title: String,
    pub status: String,
    pub status_label: String,
    pub total_amount: f64,
    pub created_at: String,
}

impl From<EstimateItem> for EstimateRow {
    fn from(item: EstimateItem) -> Self {
        EstimateRow {
            status_label: status::estimate_status_label(&item.status).to_string(),
            id: item.id,
            title: item.title,
            status: item.status,
            total_amount: item.total_amount,
            created_at: item.created_at,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EstimateDetailView {
    #[serde(flatten)]
    pub detail: EstimateDetail,
    pub status_label: String,
    /// Approve, reject and revision buttons are shown only when set.
    pub actions_allowed: bool,
}

impl From<EstimateDetail> for EstimateDetailView {
    fn from(detail: EstimateDetail) -> Self {
        EstimateDetailView {
            status_label: status::estimate_status_label(&detail.status).to_string(),
            actions_allowed: status::estimate_actions_allowed(&detail.status),
            detail,
        }
    }
}

/// Where the webview should go after an auth flow, plus the signed-in user when one was set.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AuthOutcome {
    pub next_route: String,
    pub user: Option<UserProfile>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FilePreview {
    pub mime_type: String,
    pub data_base64: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SavedFile {
    pub path: String,
    pub file_name: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SelectedFileView {
    pub path: Option<String>,
    pub name: String,
    pub size: u64,
    pub size_label: String,
}

/// Result of a file pick: what was kept and what the user should be told.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FileSelectionView {
    pub accepted: Vec<SelectedFileView>,
    pub toasts: Vec<Toast>,
}
