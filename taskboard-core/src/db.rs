use std::path::PathBuf;

use chrono::Utc;
use sqlx::sqlite::{Sqlite, SqlitePool, SqlitePoolOptions};
use sqlx::QueryBuilder;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::error::{Error, Result};
use crate::models::{NewUser, Priority, Task, TaskFields, User};
use crate::query::{TaskPage, TaskQuery, TaskStats};

const TASK_COLUMNS: &str = "id, title, description, priority, completed, estimated_hours, owner_id, created_at, updated_at";
const USER_COLUMNS: &str = "id, username, email, password_hash, created_at";

#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

/// `sqlite:` URL for the per-user data file, creating its directory.
pub fn default_database_url() -> Result<String> {
    let config_dir = dirs::state_dir()
        .or_else(dirs::config_dir)
        .or_else(|| dirs::home_dir().map(|h| h.join(".local/state")))
        .ok_or_else(|| Error::Internal("Could not find config directory".into()))?;

    let db_path: PathBuf = config_dir.join("taskboard").join("data");
    std::fs::create_dir_all(&db_path)
        .map_err(|e| Error::Internal(format!("creating {}: {e}", db_path.display())))?;

    let db_file = db_path.join("taskboard.db");
    Ok(format!("sqlite:{}?mode=rwc", db_file.display()))
}

/// Record ids are UUIDs; anything else is rejected before touching storage.
pub fn parse_task_id(id: &str) -> Result<String> {
    Uuid::parse_str(id.trim())
        .map(|id| id.to_string())
        .map_err(|_| Error::InvalidIdentifier)
}

impl Database {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Database { pool })
    }

    /// A private database that lives as long as the returned handle.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Database { pool })
    }

    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn create_user(&self, new_user: &NewUser) -> Result<User> {
        let existing = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? OR username = ? LIMIT 1"
        ))
        .bind(&new_user.email)
        .bind(&new_user.username)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(existing) = existing {
            let field = if existing.email == new_user.email {
                "email"
            } else {
                "username"
            };
            return Err(Error::DuplicateIdentity {
                field: field.to_string(),
            });
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            password_hash: hash_password(&new_user.password)?,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    /// Looks the login name up as username or email and checks the password.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ? OR email = ? LIMIT 1"
        ))
        .bind(login)
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        match user {
            Some(user) if verify_password(password, &user.password_hash) => Ok(user),
            _ => Err(Error::InvalidCredentials),
        }
    }

    pub async fn list_tasks(&self, owner_id: &str, query: &TaskQuery) -> Result<TaskPage> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM tasks");
        push_filters(&mut count, owner_id, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {TASK_COLUMNS} FROM tasks"));
        push_filters(&mut select, owner_id, query);
        select
            .push(" ORDER BY ")
            .push(query.sort.order_by())
            .push(" LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));
        let tasks = select
            .build_query_as::<Task>()
            .fetch_all(&self.pool)
            .await?;

        Ok(TaskPage::new(
            tasks,
            query.page,
            query.limit,
            u64::try_from(total).unwrap_or_default(),
        ))
    }

    pub async fn create_task(&self, owner_id: &str, fields: TaskFields) -> Result<Task> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: fields.title,
            description: fields.description,
            priority: fields.priority,
            completed: fields.completed,
            estimated_hours: fields.estimated_hours,
            owner_id: owner_id.to_string(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(&format!(
            "INSERT INTO tasks ({TASK_COLUMNS}, title_folded, description_folded)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority)
        .bind(task.completed)
        .bind(task.estimated_hours)
        .bind(&task.owner_id)
        .bind(task.created_at)
        .bind(task.updated_at)
        .bind(task.title.to_lowercase())
        .bind(task.description.to_lowercase())
        .execute(&self.pool)
        .await?;

        tracing::debug!(task_id = %task.id, owner_id, "task created");
        Ok(task)
    }

    /// Replaces every mutable field of the caller's task.
    pub async fn update_task(&self, owner_id: &str, id: &str, fields: TaskFields) -> Result<Task> {
        let id = parse_task_id(id)?;
        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks
             SET title = ?, description = ?, priority = ?, completed = ?, estimated_hours = ?,
                 updated_at = ?, title_folded = ?, description_folded = ?
             WHERE id = ? AND owner_id = ?
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.priority)
        .bind(fields.completed)
        .bind(fields.estimated_hours)
        .bind(Utc::now())
        .bind(fields.title.to_lowercase())
        .bind(fields.description.to_lowercase())
        .bind(&id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        task.ok_or(Error::NotFoundOrUnauthorized)
    }

    pub async fn delete_task(&self, owner_id: &str, id: &str) -> Result<()> {
        let id = parse_task_id(id)?;
        let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND owner_id = ?")
            .bind(&id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFoundOrUnauthorized);
        }
        tracing::debug!(task_id = %id, owner_id, "task deleted");
        Ok(())
    }

    pub async fn task_stats(&self, owner_id: &str) -> Result<TaskStats> {
        let (total, completed, total_hours, average_hours) =
            sqlx::query_as::<_, (i64, i64, f64, f64)>(
                "SELECT COUNT(*),
                        COALESCE(SUM(CASE WHEN completed THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(estimated_hours), 0.0),
                        COALESCE(AVG(estimated_hours), 0.0)
                 FROM tasks WHERE owner_id = ?",
            )
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;

        let counts = sqlx::query_as::<_, (Priority, i64)>(
            "SELECT priority, COUNT(*) FROM tasks WHERE owner_id = ? GROUP BY priority",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        let mut stats = TaskStats::empty();
        for (priority, count) in counts {
            stats
                .priority_count
                .insert(priority, u64::try_from(count).unwrap_or_default());
        }
        stats.total_tasks = u64::try_from(total).unwrap_or_default();
        stats.completed_tasks = u64::try_from(completed).unwrap_or_default();
        stats.pending_tasks = stats.total_tasks - stats.completed_tasks;
        stats.total_estimated_hours = total_hours;
        stats.average_estimated_hours = average_hours;
        Ok(stats)
    }
}

fn push_filters<'args>(
    builder: &mut QueryBuilder<'args, Sqlite>,
    owner_id: &'args str,
    query: &TaskQuery,
) {
    builder.push(" WHERE owner_id = ").push_bind(owner_id);

    if let Some(search) = &query.search {
        // sqlite lower() folds ASCII only; match against the stored folded copies
        let needle = search.to_lowercase();
        builder
            .push(" AND (instr(title_folded, ")
            .push_bind(needle.clone())
            .push(") > 0 OR instr(description_folded, ")
            .push_bind(needle)
            .push(") > 0)");
    }
    if let Some(priority) = query.priority {
        builder.push(" AND priority = ").push_bind(priority);
    }
    if let Some(status) = query.status {
        builder.push(" AND completed = ").push_bind(status.completed());
    }
}
