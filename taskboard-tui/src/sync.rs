//! Keeps the store in step with the server.
//!
//! Nothing is applied optimistically: every mutation is followed by a reload
//! of the current page, and the store only ever holds what the server sent.

use taskboard_core::validation::validate_task;
use taskboard_core::{Error, Priority, SortKey, StatusFilter, Task, TaskInput, TaskPage, WriteMode};

use crate::client::{ApiClient, ClientError};
use crate::store::Store;

/// Task endpoints the synchronizer needs.
#[allow(async_fn_in_trait)]
pub trait TaskApi {
    async fn list_tasks(&self, params: &[(&str, String)]) -> Result<TaskPage, ClientError>;
    async fn create_task(&self, input: &TaskInput) -> Result<Task, ClientError>;
    async fn update_task(&self, id: &str, input: &TaskInput) -> Result<Task, ClientError>;
    async fn delete_task(&self, id: &str) -> Result<(), ClientError>;
}

impl TaskApi for ApiClient {
    async fn list_tasks(&self, params: &[(&str, String)]) -> Result<TaskPage, ClientError> {
        ApiClient::list_tasks(self, params).await
    }

    async fn create_task(&self, input: &TaskInput) -> Result<Task, ClientError> {
        ApiClient::create_task(self, input).await
    }

    async fn update_task(&self, id: &str, input: &TaskInput) -> Result<Task, ClientError> {
        ApiClient::update_task(self, id, input).await
    }

    async fn delete_task(&self, id: &str) -> Result<(), ClientError> {
        ApiClient::delete_task(self, id).await
    }
}

fn check(input: &TaskInput, mode: WriteMode) -> Result<(), ClientError> {
    match validate_task(input, mode) {
        Ok(_) => Ok(()),
        Err(Error::Validation(errors)) => Err(ClientError::Invalid(errors)),
        Err(other) => Err(ClientError::Invalid(vec![taskboard_core::FieldError::new(
            "task",
            other.to_string(),
        )])),
    }
}

pub struct TaskManager<A> {
    api: A,
    store: Store,
}

impl<A: TaskApi> TaskManager<A> {
    pub fn new(api: A, store: Store) -> Self {
        Self { api, store }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn api_mut(&mut self) -> &mut A {
        &mut self.api
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    /// Fetches the current page and replaces the listed tasks with it.
    ///
    /// When the page no longer exists (the last task on it was removed) the
    /// last remaining page is loaded instead.
    pub async fn load_tasks(&mut self) -> Result<(), ClientError> {
        let mut page = self.api.list_tasks(&self.store.state().params()).await?;

        let requested = self.store.state().current_page;
        if page.tasks.is_empty() && page.total_pages > 0 && u64::from(requested) > page.total_pages
        {
            let last = u32::try_from(page.total_pages).unwrap_or(u32::MAX);
            let params = self
                .store
                .state()
                .filters
                .to_params(last, self.store.state().items_per_page);
            page = self.api.list_tasks(&params).await?;
        }

        // an empty listing has no page 2; show it as page 1 of 0
        let current_page = if page.total_pages == 0 {
            1
        } else {
            page.current_page
        };
        self.store.update(|state| {
            state.tasks = page.tasks;
            state.current_page = current_page;
            state.total_pages = page.total_pages;
        });
        Ok(())
    }

    /// Moves to `page` if it exists. Returns whether a reload happened.
    pub async fn change_page(&mut self, page: u32) -> Result<bool, ClientError> {
        let state = self.store.state();
        if page < 1 || u64::from(page) > state.total_pages || page == state.current_page {
            return Ok(false);
        }
        self.store.update(|state| state.current_page = page);
        self.load_tasks().await?;
        Ok(true)
    }

    pub async fn next_page(&mut self) -> Result<bool, ClientError> {
        let page = self.store.state().current_page.saturating_add(1);
        self.change_page(page).await
    }

    pub async fn previous_page(&mut self) -> Result<bool, ClientError> {
        let page = self.store.state().current_page.saturating_sub(1);
        self.change_page(page).await
    }

    pub async fn apply_search(&mut self, search: &str) -> Result<(), ClientError> {
        let search = search.trim().to_string();
        self.store.update(|state| {
            state.filters.search = search;
            state.current_page = 1;
        });
        self.load_tasks().await
    }

    pub async fn apply_filters(
        &mut self,
        priority: Option<Priority>,
        status: Option<StatusFilter>,
        sort: SortKey,
    ) -> Result<(), ClientError> {
        self.store.update(|state| {
            state.filters.priority = priority;
            state.filters.status = status;
            state.filters.sort = sort;
            state.current_page = 1;
        });
        self.load_tasks().await
    }

    pub async fn clear_filters(&mut self) -> Result<(), ClientError> {
        self.store.update(|state| {
            state.filters = Default::default();
            state.current_page = 1;
        });
        self.load_tasks().await
    }

    pub async fn create(&mut self, input: &TaskInput) -> Result<Task, ClientError> {
        check(input, WriteMode::Create)?;
        let task = self.api.create_task(input).await?;
        self.load_tasks().await?;
        Ok(task)
    }

    pub async fn update(&mut self, id: &str, input: &TaskInput) -> Result<Task, ClientError> {
        check(input, WriteMode::Replace)?;
        let task = self.api.update_task(id, input).await?;
        self.load_tasks().await?;
        Ok(task)
    }

    /// Deleting a task that is already gone is not an error.
    pub async fn delete(&mut self, id: &str) -> Result<(), ClientError> {
        match self.api.delete_task(id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        self.load_tasks().await
    }

    pub async fn toggle(&mut self, task: &Task) -> Result<Task, ClientError> {
        let input = TaskInput {
            completed: Some(!task.completed),
            ..TaskInput::from(task)
        };
        self.update(&task.id, &input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rstest::rstest;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-process stand-in for the server: newest first, owner scoping elided.
    #[derive(Default)]
    struct FakeApi {
        tasks: RefCell<Vec<Task>>,
        requests: RefCell<Vec<HashMap<String, String>>>,
        fail_listing: RefCell<bool>,
    }

    impl FakeApi {
        fn with_tasks(count: usize) -> Self {
            let api = FakeApi::default();
            for i in 0..count {
                api.tasks.borrow_mut().push(task(&format!("t{i}"), i as i64));
            }
            api
        }

        fn last_request(&self) -> HashMap<String, String> {
            self.requests.borrow().last().cloned().unwrap_or_default()
        }
    }

    fn task(id: &str, age: i64) -> Task {
        let created = Utc::now() - Duration::minutes(age);
        Task {
            id: id.into(),
            title: id.into(),
            description: String::new(),
            priority: Priority::Medium,
            completed: false,
            estimated_hours: 1.0,
            owner_id: "u".into(),
            created_at: created,
            updated_at: created,
        }
    }

    fn not_found() -> ClientError {
        ClientError::Server {
            status: 404,
            message: "Task not found or unauthorized".into(),
        }
    }

    impl TaskApi for FakeApi {
        async fn list_tasks(&self, params: &[(&str, String)]) -> Result<TaskPage, ClientError> {
            if *self.fail_listing.borrow() {
                return Err(ClientError::Server {
                    status: 500,
                    message: "An internal error occurred".into(),
                });
            }
            let params: HashMap<String, String> = params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect();
            self.requests.borrow_mut().push(params.clone());

            let page: u32 = params["page"].parse().unwrap();
            let limit: u32 = params["limit"].parse().unwrap();
            let mut tasks = self.tasks.borrow().clone();
            tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            let total = tasks.len() as u64;
            let slice = tasks
                .into_iter()
                .skip(((page - 1) * limit) as usize)
                .take(limit as usize)
                .collect();
            Ok(TaskPage::new(slice, page, limit, total))
        }

        async fn create_task(&self, input: &TaskInput) -> Result<Task, ClientError> {
            let mut created = task(input.title.as_deref().unwrap_or_default(), -1);
            created.id = format!("new-{}", self.tasks.borrow().len());
            self.tasks.borrow_mut().push(created.clone());
            Ok(created)
        }

        async fn update_task(&self, id: &str, input: &TaskInput) -> Result<Task, ClientError> {
            let mut tasks = self.tasks.borrow_mut();
            let task = tasks.iter_mut().find(|t| t.id == id).ok_or_else(not_found)?;
            task.completed = input.completed.unwrap_or_default();
            if let Some(title) = &input.title {
                task.title = title.clone();
            }
            Ok(task.clone())
        }

        async fn delete_task(&self, id: &str) -> Result<(), ClientError> {
            let mut tasks = self.tasks.borrow_mut();
            let before = tasks.len();
            tasks.retain(|t| t.id != id);
            if tasks.len() == before {
                return Err(not_found());
            }
            Ok(())
        }
    }

    async fn loaded(count: usize) -> TaskManager<FakeApi> {
        let mut manager = TaskManager::new(FakeApi::with_tasks(count), Store::new());
        manager.load_tasks().await.unwrap();
        manager
    }

    fn valid_input(title: &str) -> TaskInput {
        TaskInput {
            title: Some(title.into()),
            priority: Some("high".into()),
            estimated_hours: Some(2.0.into()),
            ..TaskInput::default()
        }
    }

    #[tokio::test]
    async fn load_replaces_tasks_and_page_count() {
        let manager = loaded(12).await;
        let state = manager.store().state();
        assert_eq!(state.tasks.len(), 5);
        assert_eq!(state.total_pages, 3);
        assert_eq!(state.current_page, 1);
        assert_eq!(state.page_stats().total, 5);
    }

    #[rstest]
    #[case(0, false)]
    #[case(1, false)]
    #[case(2, true)]
    #[case(3, true)]
    #[case(4, false)]
    #[tokio::test]
    async fn change_page_stays_in_range(#[case] page: u32, #[case] moved: bool) {
        let mut manager = loaded(12).await;
        let requests_before = manager.api().requests.borrow().len();

        assert_eq!(manager.change_page(page).await.unwrap(), moved);

        let expected_page = if moved { page } else { 1 };
        assert_eq!(manager.store().state().current_page, expected_page);
        let extra_requests = manager.api().requests.borrow().len() - requests_before;
        assert_eq!(extra_requests, usize::from(moved));
    }

    #[tokio::test]
    async fn emptied_list_goes_back_to_first_page() {
        let mut manager = loaded(6).await;
        assert!(manager.change_page(2).await.unwrap());

        manager.api().tasks.borrow_mut().clear();
        manager.load_tasks().await.unwrap();

        let state = manager.store().state();
        assert!(state.tasks.is_empty());
        assert_eq!(state.total_pages, 0);
        assert_eq!(state.current_page, 1);
    }

    #[tokio::test]
    async fn search_and_filters_reset_to_first_page() {
        let mut manager = loaded(12).await;
        manager.change_page(3).await.unwrap();

        manager.apply_search("  t1 ").await.unwrap();
        assert_eq!(manager.store().state().current_page, 1);
        assert_eq!(manager.api().last_request()["search"], "t1");
        assert_eq!(manager.api().last_request()["page"], "1");

        manager.change_page(2).await.unwrap();
        manager
            .apply_filters(Some(Priority::High), Some(StatusFilter::Completed), SortKey::Title)
            .await
            .unwrap();
        let request = manager.api().last_request();
        assert_eq!(request["page"], "1");
        assert_eq!(request["priority"], "high");
        assert_eq!(request["status"], "completed");
        assert_eq!(request["sort"], "title");
        assert_eq!(request["search"], "t1");

        manager.clear_filters().await.unwrap();
        let request = manager.api().last_request();
        assert!(!request.contains_key("search"));
        assert!(!request.contains_key("priority"));
        assert!(!request.contains_key("status"));
        assert_eq!(request["sort"], "createdAt");
        assert!(manager.store().state().filters.is_default());
    }

    #[tokio::test]
    async fn create_reloads_instead_of_inserting_locally() {
        let mut manager = loaded(5).await;
        manager.change_page(1).await.unwrap();
        let requests_before = manager.api().requests.borrow().len();

        let created = manager.create(&valid_input("fresh")).await.unwrap();

        assert_eq!(manager.api().requests.borrow().len(), requests_before + 1);
        let state = manager.store().state();
        assert_eq!(state.tasks[0].id, created.id);
        assert_eq!(state.tasks.len(), 5);
        assert_eq!(state.total_pages, 2);
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_the_server() {
        let mut manager = loaded(1).await;
        let requests_before = manager.api().requests.borrow().len();

        let error = manager.create(&TaskInput::default()).await.unwrap_err();

        assert!(matches!(error, ClientError::Invalid(ref errors) if errors.len() == 3));
        assert_eq!(manager.api().tasks.borrow().len(), 1);
        assert_eq!(manager.api().requests.borrow().len(), requests_before);
    }

    #[tokio::test]
    async fn toggle_flips_completion_and_reloads() {
        let mut manager = loaded(2).await;
        let first = manager.store().state().tasks[0].clone();

        manager.toggle(&first).await.unwrap();
        assert!(manager.store().state().tasks[0].completed);

        let first = manager.store().state().tasks[0].clone();
        manager.toggle(&first).await.unwrap();
        assert!(!manager.store().state().tasks[0].completed);
    }

    #[tokio::test]
    async fn deleting_twice_is_a_silent_no_op() {
        let mut manager = loaded(3).await;
        let id = manager.store().state().tasks[0].id.clone();

        manager.delete(&id).await.unwrap();
        manager.delete(&id).await.unwrap();

        assert_eq!(manager.store().state().tasks.len(), 2);
        assert!(manager.store().state().tasks.iter().all(|t| t.id != id));
    }

    #[tokio::test]
    async fn removing_the_last_task_on_a_page_steps_back() {
        let mut manager = loaded(6).await;
        manager.change_page(2).await.unwrap();
        let id = manager.store().state().tasks[0].id.clone();

        manager.delete(&id).await.unwrap();

        let state = manager.store().state();
        assert_eq!(state.current_page, 1);
        assert_eq!(state.total_pages, 1);
        assert_eq!(state.tasks.len(), 5);
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_state() {
        let mut manager = loaded(3).await;
        let before = manager.store().state().clone();
        *manager.api().fail_listing.borrow_mut() = true;

        let error = manager.apply_search("x").await.unwrap_err();
        assert_eq!(error.to_string(), "An internal error occurred");
        assert_eq!(manager.store().state().tasks, before.tasks);
    }
}
