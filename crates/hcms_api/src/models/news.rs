use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NewsItem {
    pub id: i64,
    pub title: String,
    pub writer_name: String,
    pub views: u64,
    pub created_at: String,
    pub category: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NewsDetail {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub writer_name: String,
    pub views: u64,
    pub created_at: String,
    pub category: String,
    pub attachment_url: Option<String>,
}
