//! Push token registration payloads for `/push` endpoints.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Mobile platform a push token was issued for.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PushPlatform {
    Ios,
    Android,
}

impl PushPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushPlatform::Ios => "ios",
            PushPlatform::Android => "android",
        }
    }
}

impl fmt::Display for PushPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PushPlatform {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "ios" => Ok(PushPlatform::Ios),
            "android" => Ok(PushPlatform::Android),
            other => Err(format!("unsupported push platform: {other}")),
        }
    }
}

/// Request body for `POST /push/register` and `DELETE /push/unregister`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PushTokenRegistration {
    pub token: String,
    pub platform: PushPlatform,
    pub device_id: Option<String>,
}

/// Token record as stored by the backend.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PushTokenRecord {
    pub id: i64,
    pub token: String,
    pub platform: String,
    pub is_active: bool,
}
