//! Observable client state.
//!
//! All changes go through [`Store::update`], which notifies every subscriber
//! once the change is applied.

use taskboard_core::query::{DEFAULT_LIMIT, DEFAULT_PAGE};
use taskboard_core::{Priority, PublicUser, SortKey, StatusFilter, Task};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub search: String,
    pub priority: Option<Priority>,
    pub status: Option<StatusFilter>,
    pub sort: SortKey,
}

impl Filters {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Query parameters for `GET /api/tasks`. Unset filters are left out.
    pub fn to_params(&self, page: u32, limit: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", page.to_string()), ("limit", limit.to_string())];

        let search = self.search.trim();
        if !search.is_empty() {
            params.push(("search", search.to_string()));
        }
        if let Some(priority) = self.priority {
            params.push(("priority", priority.to_string()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        params.push(("sort", self.sort.as_str().to_string()));
        params
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientState {
    pub current_user: Option<PublicUser>,
    pub tasks: Vec<Task>,
    pub current_page: u32,
    pub total_pages: u64,
    pub items_per_page: u32,
    pub filters: Filters,
}

impl Default for ClientState {
    fn default() -> Self {
        Self {
            current_user: None,
            tasks: Vec::new(),
            current_page: DEFAULT_PAGE,
            total_pages: 0,
            items_per_page: DEFAULT_LIMIT,
            filters: Filters::default(),
        }
    }
}

impl ClientState {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        self.filters.to_params(self.current_page, self.items_per_page)
    }

    pub fn page_stats(&self) -> PageStats {
        PageStats::from_tasks(&self.tasks)
    }
}

pub type Subscriber = Box<dyn FnMut(&ClientState)>;

#[derive(Default)]
pub struct Store {
    state: ClientState,
    subscribers: Vec<Subscriber>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&ClientState) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn update(&mut self, change: impl FnOnce(&mut ClientState)) {
        change(&mut self.state);
        for subscriber in &mut self.subscribers {
            subscriber(&self.state);
        }
    }

    /// Back to a signed-out, unfiltered first page.
    pub fn reset(&mut self) {
        self.update(|state| *state = ClientState::default());
    }
}

/// Totals over the tasks of the loaded page only.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PageStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub estimated_hours: f64,
}

impl PageStats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self {
            total: tasks.len(),
            completed,
            pending: tasks.len() - completed,
            estimated_hours: tasks.iter().map(|t| t.estimated_hours).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn task(completed: bool, hours: f64) -> Task {
        Task {
            id: "t".into(),
            title: "t".into(),
            description: String::new(),
            priority: Priority::Medium,
            completed,
            estimated_hours: hours,
            owner_id: "u".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn default_filters_send_only_page_limit_and_sort() {
        let params = Filters::default().to_params(1, 5);
        assert_eq!(
            params,
            vec![
                ("page", "1".to_string()),
                ("limit", "5".to_string()),
                ("sort", "createdAt".to_string()),
            ]
        );
    }

    #[test]
    fn set_filters_are_serialized() {
        let filters = Filters {
            search: "  report ".into(),
            priority: Some(Priority::Urgent),
            status: Some(StatusFilter::Pending),
            sort: SortKey::Priority,
        };
        let params = filters.to_params(3, 5);
        assert!(params.contains(&("search", "report".to_string())));
        assert!(params.contains(&("priority", "urgent".to_string())));
        assert!(params.contains(&("status", "pending".to_string())));
        assert!(params.contains(&("sort", "priority".to_string())));
        assert!(params.contains(&("page", "3".to_string())));
    }

    #[test]
    fn whitespace_search_is_not_sent() {
        let filters = Filters {
            search: "   ".into(),
            ..Filters::default()
        };
        assert!(filters.to_params(1, 5).iter().all(|(key, _)| *key != "search"));
    }

    #[test]
    fn every_update_notifies_every_subscriber() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut store = Store::new();
        for id in 0..2 {
            let seen = Rc::clone(&seen);
            store.subscribe(move |state: &ClientState| {
                seen.borrow_mut().push((id, state.current_page));
            });
        }

        store.update(|state| state.current_page = 2);
        store.update(|state| state.current_page = 3);

        assert_eq!(*seen.borrow(), vec![(0, 2), (1, 2), (0, 3), (1, 3)]);
    }

    #[test]
    fn reset_restores_defaults_and_notifies() {
        let notified = Rc::new(RefCell::new(0));
        let mut store = Store::new();
        let counter = Rc::clone(&notified);
        store.subscribe(move |_| *counter.borrow_mut() += 1);

        store.update(|state| {
            state.current_page = 4;
            state.filters.search = "x".into();
            state.tasks = vec![task(false, 1.0)];
        });
        store.reset();

        assert_eq!(*store.state(), ClientState::default());
        assert_eq!(*notified.borrow(), 2);
    }

    #[test]
    fn page_stats_cover_loaded_tasks_only() {
        let stats = PageStats::from_tasks(&[task(true, 2.0), task(false, 1.5), task(false, 0.5)]);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.estimated_hours, 4.0);
        assert_eq!(PageStats::from_tasks(&[]), PageStats::default());
    }
}
