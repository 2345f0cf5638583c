pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod validation;

pub use auth::{Identity, TokenSigner};
pub use db::{Database, default_database_url, parse_task_id};
pub use error::{Error, FieldError, Result};
pub use models::{
    HoursInput, LoginInput, NewUser, Priority, PublicUser, SignupInput, Task, TaskFields,
    TaskInput, User,
};
pub use query::{ListParams, SortKey, StatusFilter, TaskPage, TaskQuery, TaskStats};
pub use validation::WriteMode;
