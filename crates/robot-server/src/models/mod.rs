//! Robot server models.
//!
//! `User` and `Task` describe the shape of task data exchanged with the
//! front-end. Nothing is persisted.

use crate::auth::Claims;
use serde::{Deserialize, Serialize};

/// An authenticated user, as identified by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Provider subject identifier.
    pub id: Option<String>,

    /// Email address, when the provider includes it in the token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl User {
    /// Identify the caller from a verified claim set.
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            id: claims.subject().map(ToString::to_string),
            email: claims.custom::<String>("email"),
        }
    }
}

/// A saved robot program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,

    /// Task description shown in the front-end.
    pub text: String,

    /// Serialized robot program.
    pub prog: String,

    /// Owner's provider subject identifier.
    pub user_id: String,
}

/// Response body for `GET /tasks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksResponse {
    /// Subject of the authenticated caller.
    pub sub: Option<String>,

    /// Tasks owned by the caller.
    pub tasks: Vec<Task>,
}
