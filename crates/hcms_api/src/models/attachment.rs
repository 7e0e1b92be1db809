use serde::{Deserialize, Serialize};

/// File linked to a maintenance request, comment or inquiry.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Attachment {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
}
