//! Field constraints shared by the server and the terminal client.

use crate::error::{Error, FieldError, Result};
use crate::models::{LoginInput, NewUser, Priority, SignupInput, TaskFields, TaskInput};

pub const TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;
pub const MIN_ESTIMATED_HOURS: f64 = 0.5;
pub const MAX_ESTIMATED_HOURS: f64 = 1000.0;
pub const USERNAME_MIN_CHARS: usize = 3;
pub const PASSWORD_MIN_CHARS: usize = 8;

/// How a missing priority is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Priority must be supplied.
    Create,
    /// Full replacement: a missing priority reverts to the default.
    Replace,
}

/// Checks every task field and collects all violations before failing.
pub fn validate_task(input: &TaskInput, mode: WriteMode) -> Result<TaskFields> {
    let mut errors = Vec::new();

    let title = input.title.as_deref().map(str::trim).unwrap_or_default();
    if title.is_empty() {
        errors.push(FieldError::new("title", "Title is required"));
    } else if title.chars().count() > TITLE_MAX_CHARS {
        errors.push(FieldError::new(
            "title",
            format!("Title must be at most {TITLE_MAX_CHARS} characters"),
        ));
    }

    let description = input
        .description
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        errors.push(FieldError::new(
            "description",
            format!("Description must be at most {DESCRIPTION_MAX_CHARS} characters"),
        ));
    }

    let priority = match input.priority.as_deref().map(str::trim) {
        None | Some("") if mode == WriteMode::Create => {
            errors.push(FieldError::new("priority", "Priority is required"));
            None
        }
        None | Some("") => Some(Priority::default()),
        Some(raw) => match raw.parse::<Priority>() {
            Ok(priority) => Some(priority),
            Err(_) => {
                errors.push(FieldError::new(
                    "priority",
                    "Priority must be one of low, medium, high, urgent",
                ));
                None
            }
        },
    };

    let estimated_hours = match &input.estimated_hours {
        None => {
            errors.push(FieldError::new(
                "estimatedHours",
                "Estimated hours are required",
            ));
            None
        }
        Some(raw) => match raw.to_f64().filter(|hours| hours.is_finite()) {
            None => {
                errors.push(FieldError::new(
                    "estimatedHours",
                    "Estimated hours must be a number",
                ));
                None
            }
            Some(hours) if !(MIN_ESTIMATED_HOURS..=MAX_ESTIMATED_HOURS).contains(&hours) => {
                errors.push(FieldError::new(
                    "estimatedHours",
                    format!(
                        "Estimated hours must be between {MIN_ESTIMATED_HOURS} and {MAX_ESTIMATED_HOURS}"
                    ),
                ));
                None
            }
            Some(hours) => Some(hours),
        },
    };

    match (priority, estimated_hours) {
        (Some(priority), Some(estimated_hours)) if errors.is_empty() => Ok(TaskFields {
            title: title.to_string(),
            description: description.to_string(),
            priority,
            completed: input.completed.unwrap_or(false),
            estimated_hours,
        }),
        _ => Err(Error::Validation(errors)),
    }
}

pub fn validate_signup(input: &SignupInput) -> Result<NewUser> {
    let mut errors = Vec::new();

    let username = input.username.as_deref().map(str::trim).unwrap_or_default();
    if username.is_empty() {
        errors.push(FieldError::new("username", "Username is required"));
    } else if username.chars().count() < USERNAME_MIN_CHARS {
        errors.push(FieldError::new(
            "username",
            format!("Username must be at least {USERNAME_MIN_CHARS} characters"),
        ));
    }

    let email = input.email.as_deref().map(str::trim).unwrap_or_default();
    if email.is_empty() {
        errors.push(FieldError::new("email", "Email is required"));
    } else if !looks_like_email(email) {
        errors.push(FieldError::new("email", "Please enter a valid email address"));
    }

    let password = input.password.as_deref().unwrap_or_default();
    if password.is_empty() {
        errors.push(FieldError::new("password", "Password is required"));
    } else if password.chars().count() < PASSWORD_MIN_CHARS {
        errors.push(FieldError::new(
            "password",
            format!("Password must be at least {PASSWORD_MIN_CHARS} characters"),
        ));
    }

    if !errors.is_empty() {
        return Err(Error::Validation(errors));
    }

    Ok(NewUser {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    })
}

/// Returns the trimmed login name and the password.
pub fn validate_login(input: &LoginInput) -> Result<(String, String)> {
    let username = input.username.as_deref().map(str::trim).unwrap_or_default();
    let password = input.password.as_deref().unwrap_or_default();
    if username.is_empty() || password.is_empty() {
        return Err(Error::validation(
            "username",
            "Username and password are required",
        ));
    }
    Ok((username.to_string(), password.to_string()))
}

// one '@', no whitespace, a dot somewhere in the domain
fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}
