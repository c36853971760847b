use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;

use super::domain::{AuditAction, AuditLogEntry};

const TOP_USER_LIMIT: usize = 5;

/// Aggregate counts displayed on the admin audit dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditStatistics {
    pub total: usize,
    pub today: usize,
    pub this_week: usize,
    pub this_month: usize,
    pub by_action: Vec<ActionCount>,
    pub top_users: Vec<UserActivity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionCount {
    pub action: AuditAction,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserActivity {
    pub user_id: String,
    pub count: usize,
}

/// Summarize entries relative to an injected `now` so callers (and tests)
/// control the clock.
pub fn summarize(entries: &[AuditLogEntry], now: DateTime<Utc>) -> AuditStatistics {
    let week_floor = now - Duration::days(7);

    let mut today = 0;
    let mut this_week = 0;
    let mut this_month = 0;
    let mut actions: HashMap<AuditAction, usize> = HashMap::new();
    let mut users: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        if entry.created_at.date_naive() == now.date_naive() {
            today += 1;
        }
        if entry.created_at >= week_floor && entry.created_at <= now {
            this_week += 1;
        }
        if entry.created_at.year() == now.year() && entry.created_at.month() == now.month() {
            this_month += 1;
        }

        *actions.entry(entry.action.clone()).or_default() += 1;
        if let Some(user_id) = &entry.user_id {
            *users.entry(user_id.clone()).or_default() += 1;
        }
    }

    let mut by_action: Vec<ActionCount> = actions
        .into_iter()
        .map(|(action, count)| ActionCount { action, count })
        .collect();
    by_action.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.action.label().cmp(b.action.label()))
    });

    let mut top_users: Vec<UserActivity> = users
        .into_iter()
        .map(|(user_id, count)| UserActivity { user_id, count })
        .collect();
    top_users.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.user_id.cmp(&b.user_id)));
    top_users.truncate(TOP_USER_LIMIT);

    AuditStatistics {
        total: entries.len(),
        today,
        this_week,
        this_month,
        by_action,
        top_users,
    }
}
