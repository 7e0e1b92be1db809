//! Maintenance request models returned by `/maintenance` endpoints.

use serde::{Deserialize, Serialize};

use super::Attachment;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MaintenanceItem {
    pub id: i64,
    pub title: String,
    pub status: String,
    pub request_date: String,
    pub project_title: Option<String>,
    #[serde(default)]
    pub comments_count: u32,
}

/// Author side of a comment thread.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommentRole {
    Customer,
    Manager,
    Admin,
}

/// Represents a comment on a maintenance request; `parent_id` links replies to the comment they answer.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MaintenanceComment {
    pub id: i64,
    pub author: String,
    pub role: CommentRole,
    pub content: String,
    pub created_at: String,
    #[serde(default)]
    pub worker_type: Option<String>,
    /// Legacy single-file attachment name.
    #[serde(default)]
    pub attachment: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MaintenanceDetail {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub status: String,
    pub request_date: String,
    pub worker_type: Option<String>,
    pub worker_name: Option<String>,
    #[serde(default)]
    pub used_points: i64,
    pub project_title: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub comments: Vec<MaintenanceComment>,
}

/// Contract a new maintenance request can be filed against.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MaintenanceProject {
    pub id: i64,
    pub title: String,
    pub permit: bool,
    pub remaining_points: i64,
    pub contract_status: String,
    pub contract_date: Option<String>,
    pub contract_termination_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MaintenanceProjects {
    pub projects: Vec<MaintenanceProject>,
}
