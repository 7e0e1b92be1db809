//! Shared navigation chrome state and route helpers.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const LOGIN_ROUTE: &str = "/login";
pub const DASHBOARD_ROUTE: &str = "/dashboard";
pub const CHANGE_PASSWORD_ROUTE: &str = "/change-password";
pub const ESTIMATES_ROUTE: &str = "/estimates";

pub fn estimate_route(estimate_id: i64) -> String {
    format!("{}/{}", ESTIMATES_ROUTE, estimate_id)
}

/// Routes reachable without a session.
pub fn is_public_route(route: &str) -> bool {
    let path = route.split('?').next().unwrap_or(route);
    matches!(
        path,
        LOGIN_ROUTE | CHANGE_PASSWORD_ROUTE | "/estimate-auth" | "/contract-auth" | "/privacy" | "/terms"
    )
}

/// Route to render: `route` itself, or the login page when it needs a session that does not exist.
pub fn guard_route(route: &str, has_session: bool) -> &str {
    if has_session || is_public_route(route) {
        route
    } else {
        LOGIN_ROUTE
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub label: String,
    pub href: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct NavigationState {
    pub sidebar_open: bool,
    pub page_title: String,
    pub breadcrumbs: Vec<Breadcrumb>,
}

/// Thread-safe holder for the sidebar, page title and breadcrumbs shown by the layout.
#[derive(Clone, Default)]
pub struct NavigationStore {
    state: Arc<Mutex<NavigationState>>,
}

impl NavigationStore {
    pub fn new(sidebar_open: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(NavigationState {
                sidebar_open,
                ..NavigationState::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, NavigationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> NavigationState {
        self.lock().clone()
    }

    pub fn set_sidebar_open(&self, open: bool) {
        self.lock().sidebar_open = open;
    }

    pub fn toggle_sidebar(&self) -> bool {
        let mut state = self.lock();
        state.sidebar_open = !state.sidebar_open;
        state.sidebar_open
    }

    pub fn set_page_title(&self, title: impl Into<String>) {
        self.lock().page_title = title.into();
    }

    pub fn set_breadcrumbs(&self, breadcrumbs: Vec<Breadcrumb>) {
        self.lock().breadcrumbs = breadcrumbs;
    }

    /// Clears title and breadcrumbs; the sidebar preference survives logout.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.page_title.clear();
        state.breadcrumbs.clear();
    }
}
