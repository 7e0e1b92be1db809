//! Debounced search input and list paging state.

use std::time::Duration;

use chrono::NaiveDate;
use hcms_api::{ListQuery, PointUsageQuery};
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Write side of a debounced search box.
#[derive(Clone)]
pub struct SearchInput {
    tx: watch::Sender<String>,
}

impl SearchInput {
    /// Records the latest keystroke; only a value left untouched for the debounce window is applied.
    pub fn set(&self, value: impl Into<String>) {
        self.tx.send_replace(value.into());
    }
}

/// Spawns the debounce task. Applied search terms arrive on the returned receiver.
/// The task ends when every [`SearchInput`] handle is dropped.
pub fn debounced_search(delay: Duration) -> (SearchInput, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = watch::channel(String::new());
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    tokio::spawn(run_debounce(rx, delay, out_tx));
    (SearchInput { tx }, out_rx)
}

async fn run_debounce(mut rx: watch::Receiver<String>, delay: Duration, out: mpsc::UnboundedSender<String>) {
    while rx.changed().await.is_ok() {
        loop {
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = sleep(delay) => {
                    let value = rx.borrow_and_update().clone();
                    if out.send(value).is_err() {
                        return;
                    }
                    break;
                }
            }
        }
    }
}

/// Paging and filters of one list screen. Changing any filter returns to page 1.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListState {
    query: ListQuery,
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl ListState {
    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn apply_search(&mut self, term: &str) {
        self.query.search = non_blank(term);
        self.query.page = 1;
    }

    pub fn set_status(&mut self, status: &str) {
        self.query.status = non_blank(status);
        self.query.page = 1;
    }

    pub fn set_task_type(&mut self, task_type: &str) {
        self.query.task_type = non_blank(task_type);
        self.query.page = 1;
    }

    pub fn set_category(&mut self, category: &str) {
        self.query.category = non_blank(category);
        self.query.page = 1;
    }

    pub fn go_to_page(&mut self, page: u32) {
        self.query.page = page.max(1);
    }
}

/// Filters of the point usage screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PointUsageState {
    query: PointUsageQuery,
}

impl PointUsageState {
    pub fn query(&self) -> &PointUsageQuery {
        &self.query
    }

    pub fn select_project(&mut self, project_id: Option<i64>) {
        self.query.project_id = project_id;
        self.query.page = 1;
    }

    pub fn apply_search(&mut self, term: &str) {
        self.query.search_text = non_blank(term);
        self.query.page = 1;
    }

    pub fn set_point_type(&mut self, point_type: &str) {
        self.query.point_type = non_blank(point_type);
        self.query.page = 1;
    }

    /// Dates are `YYYY-MM-DD`; blanks clear the bound.
    pub fn set_date_range(&mut self, from: &str, to: &str) -> Result<(), String> {
        let parse = |value: &str| -> Result<Option<NaiveDate>, String> {
            match non_blank(value) {
                Some(text) => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                    .map(Some)
                    .map_err(|_| format!("잘못된 날짜 형식입니다: {text}")),
                None => Ok(None),
            }
        };
        let date_from = parse(from)?;
        let date_to = parse(to)?;
        self.query.date_from = date_from;
        self.query.date_to = date_to;
        self.query.page = 1;
        Ok(())
    }

    pub fn go_to_page(&mut self, page: u32) {
        self.query.page = page.max(1);
    }
}
