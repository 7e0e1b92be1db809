//! Point (credit) balance and usage history models.

use serde::{Deserialize, Serialize};

use super::Paginated;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PointUsageProject {
    pub id: i64,
    pub title: String,
    pub monthly_point: i64,
    pub contract_date: String,
    pub contract_termination_date: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PointUsageProjectBalance {
    pub id: i64,
    pub title: String,
    pub monthly_point: i64,
    pub remaining_points: i64,
    pub total_points: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PointUsageHistoryItem {
    pub id: i64,
    pub created_at: String,
    pub content: String,
    /// 1 = charge, 2 = usage, 3 = allotment.
    pub point_type: i32,
    pub point: i64,
    pub status: i32,
    pub worker_type: Option<i32>,
    pub managelist_title: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PointUsageWorkerStat {
    pub writer_name: String,
    pub worker_type: i32,
    pub total_used: i64,
    pub usage_count: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PointUsageChartData {
    pub month: String,
    pub usage: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PointUsageData {
    pub maintenance_customer: bool,
    pub current_project: Option<PointUsageProject>,
    #[serde(default)]
    pub projects_with_balance: Vec<PointUsageProjectBalance>,
    pub period_start: String,
    pub period_end: String,
    pub total_points: i64,
    pub used_points: i64,
    pub remaining_points: i64,
    #[serde(default)]
    pub worker_stats: Vec<PointUsageWorkerStat>,
    pub point_histories: Paginated<PointUsageHistoryItem>,
    #[serde(default)]
    pub chart_data: Vec<PointUsageChartData>,
    #[serde(default)]
    pub search_text: String,
    #[serde(default)]
    pub date_from: String,
    #[serde(default)]
    pub date_to: String,
    #[serde(default)]
    pub point_type_filter: String,
}
