use serde::{Deserialize, Serialize};

/// User creation input.
///
/// Fields are optional so that a missing field is reported by the
/// validator with a readable message. Over HTTP the body is checked as raw
/// JSON first (see `validation::validate_create_body`), so wrong types and
/// unknown keys are validation errors too.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request body for user update. Every column is overwritten; a missing
/// `name` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    pub password: String,
}

/// Response for a delete.
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}
