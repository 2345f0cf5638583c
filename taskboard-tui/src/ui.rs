use std::cell::Cell;
use std::io;
use std::rc::Rc;

use anyhow::Result;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    crossterm::{
        event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use taskboard_core::validation::{validate_login, validate_signup};
use taskboard_core::{
    Error, HoursInput, LoginInput, Priority, SignupInput, SortKey, StatusFilter, Task, TaskInput,
    TaskStats,
};

use crate::client::{ApiClient, AuthReply, ClientError};
use crate::session::{Session, SessionFile};
use crate::store::ClientState;
use crate::sync::TaskManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Auth,
    Tasks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Form,
    DeleteConfirm,
    Help,
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Signup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Username,
    Email,
    Password,
}

#[derive(Debug, Clone)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub username: String,
    pub email: String,
    pub password: String,
    pub focus: AuthField,
}

impl Default for AuthForm {
    fn default() -> Self {
        Self {
            mode: AuthMode::Login,
            username: String::new(),
            email: String::new(),
            password: String::new(),
            focus: AuthField::Username,
        }
    }
}

impl AuthForm {
    pub fn fields(&self) -> &'static [AuthField] {
        match self.mode {
            AuthMode::Login => &[AuthField::Username, AuthField::Password],
            AuthMode::Signup => &[AuthField::Username, AuthField::Email, AuthField::Password],
        }
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::Signup,
            AuthMode::Signup => AuthMode::Login,
        };
        self.password.clear();
        self.focus = AuthField::Username;
    }

    pub fn move_focus(&mut self, forward: bool) {
        self.focus = step(self.fields(), self.focus, forward);
    }

    fn focused_buffer(&mut self) -> &mut String {
        match self.focus {
            AuthField::Username => &mut self.username,
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
        }
    }

    pub fn push(&mut self, c: char) {
        self.focused_buffer().push(c);
    }

    pub fn pop(&mut self) {
        self.focused_buffer().pop();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Priority,
    Hours,
    Completed,
}

impl FormField {
    const ALL: [FormField; 5] = [
        FormField::Title,
        FormField::Description,
        FormField::Priority,
        FormField::Hours,
        FormField::Completed,
    ];
}

/// Create/edit form for one task. `editing` holds the id being replaced.
#[derive(Debug, Clone)]
pub struct TaskForm {
    pub editing: Option<String>,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub hours: String,
    pub completed: bool,
    pub focus: FormField,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self {
            editing: None,
            title: String::new(),
            description: String::new(),
            priority: Priority::default(),
            hours: String::new(),
            completed: false,
            focus: FormField::Title,
        }
    }
}

impl TaskForm {
    pub fn from_task(task: &Task) -> Self {
        Self {
            editing: Some(task.id.clone()),
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            hours: task.estimated_hours.to_string(),
            completed: task.completed,
            focus: FormField::Title,
        }
    }

    pub fn to_input(&self) -> TaskInput {
        let hours = self.hours.trim();
        TaskInput {
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            priority: Some(self.priority.to_string()),
            completed: Some(self.completed),
            estimated_hours: (!hours.is_empty()).then(|| HoursInput::Text(hours.to_string())),
        }
    }

    pub fn move_focus(&mut self, forward: bool) {
        self.focus = step(&FormField::ALL, self.focus, forward);
    }

    pub fn push(&mut self, c: char) {
        match self.focus {
            FormField::Title => self.title.push(c),
            FormField::Description => self.description.push(c),
            FormField::Hours => self.hours.push(c),
            FormField::Priority | FormField::Completed if c == ' ' => self.cycle(true),
            FormField::Priority | FormField::Completed => {}
        }
    }

    pub fn pop(&mut self) {
        match self.focus {
            FormField::Title => {
                self.title.pop();
            }
            FormField::Description => {
                self.description.pop();
            }
            FormField::Hours => {
                self.hours.pop();
            }
            FormField::Priority | FormField::Completed => {}
        }
    }

    /// Left/right on the priority and completed fields.
    pub fn cycle(&mut self, forward: bool) {
        match self.focus {
            FormField::Priority => self.priority = step(&Priority::ALL, self.priority, forward),
            FormField::Completed => self.completed = !self.completed,
            _ => {}
        }
    }
}

fn step<T: Copy + PartialEq>(items: &[T], current: T, forward: bool) -> T {
    let index = items.iter().position(|item| *item == current).unwrap_or(0);
    let next = if forward {
        (index + 1) % items.len()
    } else {
        (index + items.len() - 1) % items.len()
    };
    items[next]
}

pub fn next_priority_filter(current: Option<Priority>) -> Option<Priority> {
    match current {
        None => Some(Priority::ALL[0]),
        Some(priority) => {
            let index = Priority::ALL.iter().position(|p| *p == priority)?;
            Priority::ALL.get(index + 1).copied()
        }
    }
}

pub fn next_status_filter(current: Option<StatusFilter>) -> Option<StatusFilter> {
    match current {
        None => Some(StatusFilter::Pending),
        Some(StatusFilter::Pending) => Some(StatusFilter::Completed),
        Some(StatusFilter::Completed) => None,
    }
}

pub fn next_sort(current: SortKey) -> SortKey {
    step(&SortKey::ALL, current, true)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub is_error: bool,
}

pub struct App {
    pub manager: TaskManager<ApiClient>,
    pub session_file: SessionFile,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub list_state: ListState,
    pub auth: AuthForm,
    pub form: TaskForm,
    pub search_buffer: String,
    pub delete_target: Option<Task>,
    pub server_stats: Option<TaskStats>,
    pub message: Option<Message>,
    tasks_changed: Rc<Cell<bool>>,
}

impl App {
    pub fn new(mut manager: TaskManager<ApiClient>, session_file: SessionFile) -> Self {
        let tasks_changed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&tasks_changed);
        manager
            .store_mut()
            .subscribe(move |_: &ClientState| flag.set(true));

        Self {
            manager,
            session_file,
            screen: Screen::Auth,
            input_mode: InputMode::Normal,
            list_state: ListState::default(),
            auth: AuthForm::default(),
            form: TaskForm::default(),
            search_buffer: String::new(),
            delete_target: None,
            server_stats: None,
            message: None,
            tasks_changed,
        }
    }

    pub fn state(&self) -> &ClientState {
        self.manager.store().state()
    }

    fn info(&mut self, text: impl Into<String>) {
        self.message = Some(Message {
            text: text.into(),
            is_error: false,
        });
    }

    fn error(&mut self, text: impl Into<String>) {
        self.message = Some(Message {
            text: text.into(),
            is_error: true,
        });
    }

    /// Shows a failed request. A rejected token ends the session.
    fn report(&mut self, error: ClientError) {
        if error.is_unauthorized() && self.screen == Screen::Tasks {
            self.logout();
            self.error("Session expired. Please log in again.");
        } else {
            self.error(error.to_string());
        }
    }

    pub async fn restore_session(&mut self) {
        let Some(session) = self.session_file.load() else {
            return;
        };
        self.begin_session(session).await;
    }

    async fn begin_session(&mut self, session: Session) {
        self.manager.api_mut().set_token(Some(session.token));
        let user = session.current_user;
        self.manager
            .store_mut()
            .update(|state| state.current_user = Some(user));
        self.screen = Screen::Tasks;
        self.input_mode = InputMode::Normal;
        if let Err(e) = self.manager.load_tasks().await {
            self.report(e);
        }
    }

    pub async fn submit_auth(&mut self) {
        let reply = match self.auth.mode {
            AuthMode::Login => {
                let input = LoginInput {
                    username: Some(self.auth.username.clone()),
                    password: Some(self.auth.password.clone()),
                };
                if let Err(e) = validate_login(&input) {
                    return self.error(validation_text(e));
                }
                self.manager.api().login(&input).await
            }
            AuthMode::Signup => {
                let input = SignupInput {
                    username: Some(self.auth.username.clone()),
                    email: Some(self.auth.email.clone()),
                    password: Some(self.auth.password.clone()),
                };
                if let Err(e) = validate_signup(&input) {
                    return self.error(validation_text(e));
                }
                self.manager.api().signup(&input).await
            }
        };

        match reply {
            Ok(AuthReply { token, user }) => {
                let session = Session {
                    current_user: user,
                    token,
                };
                if let Err(e) = self.session_file.save(&session) {
                    self.error(format!("Could not save session: {e}"));
                } else {
                    self.message = None;
                }
                let username = session.current_user.username.clone();
                self.auth = AuthForm::default();
                self.begin_session(session).await;
                if self.message.is_none() {
                    self.info(format!("Welcome, {username}"));
                }
            }
            Err(e) => self.error(e.to_string()),
        }
    }

    pub fn logout(&mut self) {
        if let Err(e) = self.session_file.clear() {
            self.error(format!("Could not remove session: {e}"));
        }
        self.manager.api_mut().set_token(None);
        self.manager.store_mut().reset();
        self.screen = Screen::Auth;
        self.input_mode = InputMode::Normal;
        self.server_stats = None;
        self.delete_target = None;
        self.list_state.select(None);
    }

    /// Keeps the list selection inside the freshly loaded page.
    pub fn sync_selection(&mut self) {
        if !self.tasks_changed.replace(false) {
            return;
        }
        let len = self.state().tasks.len();
        let selected = match self.list_state.selected() {
            _ if len == 0 => None,
            Some(i) if i >= len => Some(len - 1),
            Some(i) => Some(i),
            None => Some(0),
        };
        self.list_state.select(selected);
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.list_state
            .selected()
            .and_then(|i| self.state().tasks.get(i))
    }

    pub fn next_task(&mut self) {
        let len = self.state().tasks.len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous_task(&mut self) {
        let len = self.state().tasks.len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    pub async fn reload(&mut self) {
        if let Err(e) = self.manager.load_tasks().await {
            self.report(e);
        }
    }

    pub async fn next_page(&mut self) {
        match self.manager.next_page().await {
            Ok(true) => self.list_state.select(Some(0)),
            Ok(false) => {}
            Err(e) => self.report(e),
        }
    }

    pub async fn previous_page(&mut self) {
        match self.manager.previous_page().await {
            Ok(true) => self.list_state.select(Some(0)),
            Ok(false) => {}
            Err(e) => self.report(e),
        }
    }

    pub fn start_search(&mut self) {
        self.search_buffer = self.state().filters.search.clone();
        self.input_mode = InputMode::Search;
    }

    pub async fn finish_search(&mut self) {
        self.input_mode = InputMode::Normal;
        let search = std::mem::take(&mut self.search_buffer);
        if let Err(e) = self.manager.apply_search(&search).await {
            self.report(e);
        }
    }

    pub fn cancel_search(&mut self) {
        self.input_mode = InputMode::Normal;
        self.search_buffer.clear();
    }

    async fn apply_filters(
        &mut self,
        priority: Option<Priority>,
        status: Option<StatusFilter>,
        sort: SortKey,
    ) {
        if let Err(e) = self.manager.apply_filters(priority, status, sort).await {
            self.report(e);
        }
    }

    pub async fn cycle_priority_filter(&mut self) {
        let filters = self.state().filters.clone();
        let priority = next_priority_filter(filters.priority);
        self.apply_filters(priority, filters.status, filters.sort)
            .await;
    }

    pub async fn cycle_status_filter(&mut self) {
        let filters = self.state().filters.clone();
        let status = next_status_filter(filters.status);
        self.apply_filters(filters.priority, status, filters.sort)
            .await;
    }

    pub async fn cycle_sort(&mut self) {
        let filters = self.state().filters.clone();
        let sort = next_sort(filters.sort);
        self.apply_filters(filters.priority, filters.status, sort)
            .await;
    }

    pub async fn clear_filters(&mut self) {
        if let Err(e) = self.manager.clear_filters().await {
            self.report(e);
        }
    }

    pub fn start_creating(&mut self) {
        self.form = TaskForm::default();
        self.input_mode = InputMode::Form;
    }

    pub fn start_editing(&mut self) {
        if let Some(task) = self.selected_task() {
            self.form = TaskForm::from_task(task);
            self.input_mode = InputMode::Form;
        }
    }

    pub async fn finish_form(&mut self) {
        let input = self.form.to_input();
        let result = match &self.form.editing {
            Some(id) => {
                let id = id.clone();
                self.manager.update(&id, &input).await
            }
            None => self.manager.create(&input).await,
        };

        match result {
            Ok(task) => {
                let verb = if self.form.editing.is_some() {
                    "Updated"
                } else {
                    "Created"
                };
                self.info(format!("{verb} '{}'", task.title));
                self.cancel_form();
            }
            // stay in the form so the input can be corrected
            Err(e @ ClientError::Invalid(_)) => self.error(e.to_string()),
            Err(e) => {
                self.cancel_form();
                self.report(e);
            }
        }
    }

    pub fn cancel_form(&mut self) {
        self.input_mode = InputMode::Normal;
        self.form = TaskForm::default();
    }

    pub async fn toggle_selected(&mut self) {
        let Some(task) = self.selected_task().cloned() else {
            return;
        };
        if let Err(e) = self.manager.toggle(&task).await {
            self.report(e);
        }
    }

    pub fn start_delete_confirm(&mut self) {
        if let Some(task) = self.selected_task().cloned() {
            self.delete_target = Some(task);
            self.input_mode = InputMode::DeleteConfirm;
        }
    }

    pub async fn confirm_delete(&mut self) {
        let target = self.delete_target.take();
        self.input_mode = InputMode::Normal;
        if let Some(task) = target {
            match self.manager.delete(&task.id).await {
                Ok(()) => self.info(format!("Deleted '{}'", task.title)),
                Err(e) => self.report(e),
            }
        }
    }

    pub fn cancel_delete_confirm(&mut self) {
        self.input_mode = InputMode::Normal;
        self.delete_target = None;
    }

    pub async fn show_server_stats(&mut self) {
        match self.manager.api().task_stats().await {
            Ok(stats) => {
                self.server_stats = Some(stats);
                self.input_mode = InputMode::Stats;
            }
            Err(e) => self.report(e),
        }
    }
}

fn validation_text(error: Error) -> String {
    match error {
        Error::Validation(errors) => ClientError::Invalid(errors).to_string(),
        other => other.to_string(),
    }
}

pub async fn run_app(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    app.restore_session().await;

    let res = run_app_loop(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

async fn run_app_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.sync_selection();
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            let quit = match app.screen {
                Screen::Auth => handle_auth_key(app, key).await,
                Screen::Tasks => handle_tasks_key(app, key).await,
            };
            if quit {
                return Ok(());
            }
        }
    }
}

async fn handle_auth_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => return true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
        KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.auth.toggle_mode();
            app.message = None;
        }
        KeyCode::Tab | KeyCode::Down => app.auth.move_focus(true),
        KeyCode::BackTab | KeyCode::Up => app.auth.move_focus(false),
        KeyCode::Enter => app.submit_auth().await,
        KeyCode::Backspace => app.auth.pop(),
        KeyCode::Char(c) => app.auth.push(c),
        _ => {}
    }
    false
}

async fn handle_tasks_key(app: &mut App, key: KeyEvent) -> bool {
    match app.input_mode {
        InputMode::Normal => match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Down | KeyCode::Char('j') => app.next_task(),
            KeyCode::Up | KeyCode::Char('k') => app.previous_task(),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(']') => app.next_page().await,
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('[') => app.previous_page().await,
            KeyCode::Char('a') => app.start_creating(),
            KeyCode::Char('e') | KeyCode::Enter => app.start_editing(),
            KeyCode::Char('c') => app.toggle_selected().await,
            KeyCode::Char('D') => app.start_delete_confirm(),
            KeyCode::Char('/') => app.start_search(),
            KeyCode::Char('p') => app.cycle_priority_filter().await,
            KeyCode::Char('f') => app.cycle_status_filter().await,
            KeyCode::Char('o') => app.cycle_sort().await,
            KeyCode::Char('x') => app.clear_filters().await,
            KeyCode::Char('r') => app.reload().await,
            KeyCode::Char('s') => app.show_server_stats().await,
            KeyCode::Char('L') => {
                app.logout();
                app.info("Logged out");
            }
            KeyCode::Char('?') => app.input_mode = InputMode::Help,
            _ => {}
        },
        InputMode::Search => match key.code {
            KeyCode::Enter => app.finish_search().await,
            KeyCode::Esc => app.cancel_search(),
            KeyCode::Backspace => {
                app.search_buffer.pop();
            }
            KeyCode::Char(c) => app.search_buffer.push(c),
            _ => {}
        },
        InputMode::Form => match key.code {
            KeyCode::Enter => app.finish_form().await,
            KeyCode::Esc => app.cancel_form(),
            KeyCode::Tab | KeyCode::Down => app.form.move_focus(true),
            KeyCode::BackTab | KeyCode::Up => app.form.move_focus(false),
            KeyCode::Left => app.form.cycle(false),
            KeyCode::Right => app.form.cycle(true),
            KeyCode::Backspace => app.form.pop(),
            KeyCode::Char(c) => app.form.push(c),
            _ => {}
        },
        InputMode::DeleteConfirm => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete().await,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_delete_confirm(),
            _ => {}
        },
        InputMode::Help | InputMode::Stats => match key.code {
            KeyCode::Char('?') | KeyCode::Char('s') | KeyCode::Esc | KeyCode::Char('q') => {
                app.input_mode = InputMode::Normal;
            }
            _ => {}
        },
    }
    false
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::Green,
        Priority::Medium => Color::Yellow,
        Priority::High => Color::LightRed,
        Priority::Urgent => Color::Red,
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    match app.screen {
        Screen::Auth => draw_auth(f, app, main_chunks[0]),
        Screen::Tasks => draw_tasks(f, app, main_chunks[0]),
    }

    let status_bar = match &app.message {
        Some(message) => {
            let color = if message.is_error {
                Color::Red
            } else {
                Color::Green
            };
            Paragraph::new(message.text.as_str())
                .style(Style::default().fg(Color::White).bg(color))
        }
        None => {
            let hint = match app.screen {
                Screen::Auth => "enter: submit | tab: next field | ctrl-t: login/signup | esc: quit",
                Screen::Tasks => "q: quit | ?: help",
            };
            Paragraph::new(hint).style(Style::default().fg(Color::White).bg(Color::DarkGray))
        }
    };
    f.render_widget(status_bar, main_chunks[1]);
}

/// Names the form and the server it will talk to.
fn auth_title(mode: AuthMode, server: &str) -> String {
    let mode = match mode {
        AuthMode::Login => "login",
        AuthMode::Signup => "signup",
    };
    format!("{mode} ({server})")
}

fn draw_auth(f: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect(50, 40, area);
    f.render_widget(Clear, popup_area);

    let title = auth_title(app.auth.mode, app.manager.api().base_url());
    let lines: Vec<Line> = app
        .auth
        .fields()
        .iter()
        .map(|field| {
            let (label, value) = match field {
                AuthField::Username if app.auth.mode == AuthMode::Login => {
                    ("username or email", app.auth.username.clone())
                }
                AuthField::Username => ("username", app.auth.username.clone()),
                AuthField::Email => ("email", app.auth.email.clone()),
                AuthField::Password => ("password", "*".repeat(app.auth.password.chars().count())),
            };
            let style = if *field == app.auth.focus {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!("{label:>18}: "), style),
                Span::raw(value),
            ])
        })
        .collect();

    let form = Paragraph::new(lines).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    );
    f.render_widget(form, popup_area);
}

fn draw_tasks(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let state = app.manager.store().state();
    let filters = &state.filters;
    let user = state
        .current_user
        .as_ref()
        .map(|u| u.username.as_str())
        .unwrap_or_default();
    let filter_line = format!(
        "search: {} | priority: {} | status: {} | sort: {}",
        if filters.search.is_empty() {
            "-"
        } else {
            filters.search.as_str()
        },
        filters.priority.map_or("all", Priority::as_str),
        filters.status.map_or("all", StatusFilter::as_str),
        filters.sort.as_str(),
    );
    let filter_bar = Paragraph::new(filter_line).block(
        Block::default()
            .title(format!("filters ({user})"))
            .borders(Borders::ALL),
    );
    f.render_widget(filter_bar, chunks[0]);

    let task_items: Vec<ListItem> = state
        .tasks
        .iter()
        .map(|task| {
            let checkbox = if task.completed { "×" } else { " " };
            let label = format!("[{checkbox}] {}", task.title);
            let title_span = if task.completed {
                Span::styled(
                    label,
                    Style::default()
                        .add_modifier(Modifier::CROSSED_OUT)
                        .fg(Color::DarkGray),
                )
            } else {
                Span::raw(label)
            };
            let priority_span = Span::styled(
                format!(" {}", task.priority),
                Style::default().fg(priority_color(task.priority)),
            );
            let detail_span = Span::styled(
                format!(
                    " {}h ({})",
                    task.estimated_hours,
                    task.created_at.format("%m/%d/%y")
                ),
                Style::default().fg(Color::DarkGray),
            );
            ListItem::new(Line::from(vec![title_span, priority_span, detail_span]))
        })
        .collect();

    let empty = task_items.is_empty();
    let tasks = List::new(task_items)
        .block(
            Block::default()
                .title("tasks")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .highlight_symbol(">> ");

    let stats = state.page_stats();
    let page_line = format!(
        "page {}/{} | {} tasks | {} completed | {} pending | {}h estimated",
        state.current_page,
        state.total_pages.max(1),
        stats.total,
        stats.completed,
        stats.pending,
        stats.estimated_hours,
    );
    let page_bar =
        Paragraph::new(page_line).block(Block::default().title("page").borders(Borders::ALL));
    f.render_widget(page_bar, chunks[2]);

    if empty {
        let hint = if filters.is_default() {
            "No tasks yet. Press a to add one."
        } else {
            "No tasks match the current filters. Press x to clear them."
        };
        let placeholder = Paragraph::new(hint)
            .block(Block::default().title("tasks").borders(Borders::ALL))
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(placeholder, chunks[1]);
    } else {
        f.render_stateful_widget(tasks, chunks[1], &mut app.list_state);
    }

    draw_popup(f, app);
}

fn draw_popup(f: &mut Frame, app: &App) {
    match app.input_mode {
        InputMode::Search => {
            let popup_area = centered_rect(60, 20, f.area());
            f.render_widget(Clear, popup_area);

            let input = Paragraph::new(app.search_buffer.as_str())
                .block(Block::default().title("search").borders(Borders::ALL))
                .style(Style::default().fg(Color::Yellow));
            f.render_widget(input, popup_area);
        }
        InputMode::Form => {
            let popup_area = centered_rect(70, 50, f.area());
            f.render_widget(Clear, popup_area);

            let form = &app.form;
            let lines: Vec<Line> = FormField::ALL
                .iter()
                .map(|field| {
                    let (label, value) = match field {
                        FormField::Title => ("title", form.title.clone()),
                        FormField::Description => ("description", form.description.clone()),
                        FormField::Priority => ("priority", format!("< {} >", form.priority)),
                        FormField::Hours => ("estimated hours", form.hours.clone()),
                        FormField::Completed => (
                            "completed",
                            if form.completed { "[×]" } else { "[ ]" }.to_string(),
                        ),
                    };
                    let style = if *field == form.focus {
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    };
                    Line::from(vec![
                        Span::styled(format!("{label:>16}: "), style),
                        Span::raw(value),
                    ])
                })
                .collect();

            let title = if form.editing.is_some() {
                "edit task"
            } else {
                "new task"
            };
            let input = Paragraph::new(lines)
                .block(Block::default().title(title).borders(Borders::ALL))
                .style(Style::default().fg(Color::Green))
                .wrap(Wrap { trim: false });
            f.render_widget(input, popup_area);
        }
        InputMode::DeleteConfirm => {
            let popup_area = centered_rect(60, 20, f.area());
            f.render_widget(Clear, popup_area);

            let target_name = app
                .delete_target
                .as_ref()
                .map_or("task", |task| task.title.as_str());
            let confirm_text = format!("Delete '{target_name}'?\n\ny: confirm | n/esc: cancel");
            let confirm = Paragraph::new(confirm_text)
                .block(
                    Block::default()
                        .title("confirm delete")
                        .borders(Borders::ALL),
                )
                .style(Style::default().fg(Color::Red));
            f.render_widget(confirm, popup_area);
        }
        InputMode::Stats => {
            let popup_area = centered_rect(50, 50, f.area());
            f.render_widget(Clear, popup_area);

            let text = app
                .server_stats
                .as_ref()
                .map(stats_text)
                .unwrap_or_default();
            let stats = Paragraph::new(text)
                .block(Block::default().title("all tasks").borders(Borders::ALL))
                .style(Style::default().fg(Color::White));
            f.render_widget(stats, popup_area);
        }
        InputMode::Help => {
            let popup_area = centered_rect(80, 70, f.area());
            f.render_widget(Clear, popup_area);

            let help_text = r#"Navigation:
  j/k: move up/down in the list
  h/l or [/]: previous/next page

Actions:
  a: add task
  e/enter: edit selected task
  c: complete/uncomplete task
  D: delete selected task
  r: reload

Filters:
  /: search title and description
  p: cycle priority filter
  f: cycle status filter
  o: cycle sort order
  x: clear filters

  s: totals over all tasks
  L: log out
  ?: show/hide this help
  q: quit

Press ? or ESC to close"#;
            let help = Paragraph::new(help_text)
                .block(Block::default().title("help").borders(Borders::ALL))
                .style(Style::default().fg(Color::White));
            f.render_widget(help, popup_area);
        }
        InputMode::Normal => {}
    }
}

fn stats_text(stats: &TaskStats) -> String {
    let mut text = format!(
        "total: {}\ncompleted: {}\npending: {}\nestimated hours: {}\naverage hours: {:.1}\n",
        stats.total_tasks,
        stats.completed_tasks,
        stats.pending_tasks,
        stats.total_estimated_hours,
        stats.average_estimated_hours,
    );
    for (priority, count) in &stats.priority_count {
        text.push_str(&format!("\n{priority}: {count}"));
    }
    text
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
