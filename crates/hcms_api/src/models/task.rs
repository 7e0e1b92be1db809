//! Inditask (one-off billable task ticket) models.

use serde::{Deserialize, Serialize};

use super::{Attachment, CommentRole};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TaskItem {
    pub id: i64,
    pub title: String,
    pub task_type: String,
    pub task_type_label: String,
    pub status: String,
    pub created_at: String,
    pub deadline: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TaskComment {
    pub id: i64,
    pub author: String,
    pub role: CommentRole,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TaskDetail {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub task_type: String,
    pub task_type_label: String,
    pub status: String,
    pub created_at: String,
    pub deadline: Option<String>,
    pub worker_name: Option<String>,
    pub budget: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub comments: Vec<TaskComment>,
}
