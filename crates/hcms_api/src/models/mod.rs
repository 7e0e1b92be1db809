mod attachment;
mod dashboard;
mod estimate;
mod inquiry;
mod maintenance;
mod news;
mod pagination;
mod point_usage;
mod push;
mod task;
mod user;

use serde::{Deserialize, Serialize};

pub use attachment::Attachment;
pub use dashboard::{
    DashboardData, DashboardUser, LatestNews, MaintenanceStats, MonthlyPayment, PointSummary,
    ProjectProgress, RecentActivity, StatCards, WorkerStat,
};
pub use estimate::{
    ActionResult, EstimateDetail, EstimateItem, EstimateLineItem, RejectRequest, RevisionRequest,
};
pub use inquiry::{InquiryAnswer, InquiryDetail, InquiryItem};
pub use maintenance::{
    CommentRole, MaintenanceComment, MaintenanceDetail, MaintenanceItem, MaintenanceProject,
    MaintenanceProjects,
};
pub use news::{NewsDetail, NewsItem};
pub use pagination::Paginated;
pub use point_usage::{
    PointUsageChartData, PointUsageData, PointUsageHistoryItem, PointUsageProject,
    PointUsageProjectBalance, PointUsageWorkerStat,
};
pub use push::{PushPlatform, PushTokenRecord, PushTokenRegistration};
pub use task::{TaskComment, TaskDetail, TaskItem};
pub use user::{
    ChangePasswordRequest, ContractLinkLogin, EstimateLinkLogin, LoginRequest, LoginResponse,
    SiteKeyLoginRequest, UserProfile,
};

/// Acknowledgement returned by create endpoints.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Created {
    pub id: i64,
    #[serde(default)]
    pub message: String,
}

/// Plain `{ "message": ... }` acknowledgement.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}
