//! The shape shared by every remote collection.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::types::{Habit, NewHabit, NewTodo, Todo};

/// A kind of item stored under one base path on the server.
pub trait Resource: Debug + Clone + PartialEq + DeserializeOwned {
    /// Path segment under the base URL, e.g. `todos`.
    const PATH: &'static str;

    /// Singular name used in log lines.
    const NAME: &'static str;

    /// Client-built payload for a create call.
    type Draft: Debug + Serialize;

    fn id(&self) -> &str;

    /// Reject a draft before any request is built.
    fn validate(draft: &Self::Draft) -> Result<(), ApiError>;
}

impl Resource for Todo {
    const PATH: &'static str = "todos";
    const NAME: &'static str = "todo";
    type Draft = NewTodo;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(draft: &NewTodo) -> Result<(), ApiError> {
        require_non_blank("title", &draft.title)
    }
}

impl Resource for Habit {
    const PATH: &'static str = "habits";
    const NAME: &'static str = "habit";
    type Draft = NewHabit;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(draft: &NewHabit) -> Result<(), ApiError> {
        require_non_blank("name", &draft.name)
    }
}

fn require_non_blank(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}
