//! Filter, sort and page parameters for listing tasks.
//!
//! Parsing is lenient: unknown enum values and unusable numbers fall back to
//! "no filter" or the default instead of failing the request.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::models::{Priority, Task};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 5;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Completed,
    Pending,
}

impl StatusFilter {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "completed" => Some(Self::Completed),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }

    pub const fn completed(self) -> bool {
        matches!(self, Self::Completed)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
        }
    }
}

/// Named ordering strategies for the task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortKey {
    /// Newest first.
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
    /// Ascending lexicographic.
    #[serde(rename = "title")]
    Title,
    /// Severity rank descending, then newest first.
    #[serde(rename = "priority")]
    Priority,
    /// Largest estimate first.
    #[serde(rename = "estimatedHours")]
    EstimatedHours,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        SortKey::CreatedAt,
        SortKey::Title,
        SortKey::Priority,
        SortKey::EstimatedHours,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == value)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SortKey::CreatedAt => "createdAt",
            SortKey::Title => "title",
            SortKey::Priority => "priority",
            SortKey::EstimatedHours => "estimatedHours",
        }
    }

    /// ORDER BY body for the `tasks` table.
    ///
    /// Every strategy ends with `created_at DESC, rowid DESC` so rows that tie
    /// on the primary key keep a fixed position across pages.
    pub fn order_by(self) -> String {
        let primary = match self {
            SortKey::CreatedAt => String::new(),
            SortKey::Title => "title ASC, ".to_string(),
            SortKey::EstimatedHours => "estimated_hours DESC, ".to_string(),
            SortKey::Priority => format!("{} DESC, ", severity_rank_expression()),
        };
        format!("{primary}created_at DESC, rowid DESC")
    }
}

/// SQL expression mapping the stored priority string to its severity rank.
pub fn severity_rank_expression() -> String {
    let mut expression = String::from("CASE priority");
    for priority in Priority::ALL {
        let _ = write!(
            expression,
            " WHEN '{}' THEN {}",
            priority.as_str(),
            priority.severity()
        );
    }
    let _ = write!(expression, " ELSE {} END", Priority::Low.severity());
    expression
}

/// Raw query-string parameters as received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    pub search: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<StatusFilter>,
    pub sort: SortKey,
    pub page: u32,
    pub limit: u32,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            search: None,
            priority: None,
            status: None,
            sort: SortKey::default(),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl TaskQuery {
    pub fn from_params(params: &ListParams) -> Self {
        let text = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        let number = |value: &Option<String>| {
            value
                .as_deref()
                .and_then(|value| value.trim().parse::<u32>().ok())
                .filter(|value| *value >= 1)
        };

        Self {
            search: text(&params.search),
            priority: text(&params.priority).and_then(|value| value.parse().ok()),
            status: text(&params.status).and_then(|value| StatusFilter::parse(&value)),
            sort: text(&params.sort)
                .and_then(|value| SortKey::parse(&value))
                .unwrap_or_default(),
            page: number(&params.page).unwrap_or(DEFAULT_PAGE),
            limit: number(&params.limit).unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of a filtered, sorted task listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub current_page: u32,
    pub total_pages: u64,
    pub total_tasks: u64,
    pub has_more: bool,
}

impl TaskPage {
    pub fn new(tasks: Vec<Task>, page: u32, limit: u32, total_tasks: u64) -> Self {
        let total_pages = total_tasks.div_ceil(u64::from(limit.max(1)));
        Self {
            tasks,
            current_page: page,
            total_pages,
            total_tasks,
            has_more: u64::from(page) < total_pages,
        }
    }
}

/// Aggregates over every task the caller owns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub pending_tasks: u64,
    pub total_estimated_hours: f64,
    pub average_estimated_hours: f64,
    pub priority_count: BTreeMap<Priority, u64>,
}

impl TaskStats {
    pub fn empty() -> Self {
        Self {
            priority_count: Priority::ALL.into_iter().map(|p| (p, 0)).collect(),
            ..Self::default()
        }
    }
}
