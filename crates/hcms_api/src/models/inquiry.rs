//! Support inquiry models.

use serde::{Deserialize, Serialize};

use super::Attachment;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InquiryItem {
    pub id: i64,
    pub title: String,
    pub status: i32,
    pub status_label: String,
    pub inquiry_type: i32,
    pub inquiry_type_label: String,
    pub created_at: String,
    #[serde(default)]
    pub answer_count: u32,
}

/// Represents an answer on an inquiry; `parent_answer_id` threads replies.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InquiryAnswer {
    pub id: i64,
    pub author: String,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub parent_answer_id: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InquiryDetail {
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
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub answers: Vec<InquiryAnswer>,
}
