//! Typed HCMS customer portal API client used by the native app backend.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod requests;
pub mod retry;

pub use client::{BinaryContent, DownloadKind, PortalClient};
pub use config::PortalConfig;
pub use error::{PortalError, Result};
pub use requests::{
    FileUpload, ListQuery, NewComment, NewInquiry, NewInquiryAnswer, NewMaintenanceRequest,
    NewTask, PointUsageExport, PointUsageQuery, DEFAULT_PER_PAGE, POINT_USAGE_PER_PAGE,
};
pub use retry::RetryPolicy;
