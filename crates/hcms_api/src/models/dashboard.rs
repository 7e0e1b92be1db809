//! Dashboard summary returned by `GET /dashboard`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DashboardUser {
    pub name: String,
    pub company_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StatCards {
    pub maintenance_count: u64,
    pub task_count: u64,
    pub news_count: u64,
    pub estimate_count: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RecentActivity {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub date: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MaintenanceStats {
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub monthly_requests: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WorkerStat {
    pub name: String,
    pub completed_count: u64,
    pub in_progress_count: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LatestNews {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MonthlyPayment {
    pub total_amount: f64,
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PointSummary {
    pub total_points: i64,
    pub used_points: i64,
    pub remaining_points: i64,
    pub point_percent: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProjectProgress {
    pub id: i64,
    pub title: String,
    pub status: String,
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub progress: f64,
    pub contract_date: Option<String>,
    pub contract_termination_date: Option<String>,
    pub project_type: Option<String>,
    pub monthly_point: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DashboardData {
    pub user: DashboardUser,
    pub stat_cards: StatCards,
    #[serde(default)]
    pub recent_activities: Vec<RecentActivity>,
    pub maintenance_stats: MaintenanceStats,
    pub response_rate: f64,
    #[serde(default)]
    pub worker_stats: Vec<WorkerStat>,
    #[serde(default)]
    pub latest_news: Vec<LatestNews>,
    pub monthly_payment: MonthlyPayment,
    pub point_summary: PointSummary,
    #[serde(default)]
    pub project_progress: Vec<ProjectProgress>,
}
