//! Input rules for user payloads.
//!
//! Checks run field by field (username, email, password) and stop at the
//! first violation, whose message is returned to the caller.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::UserError;
use crate::users::dto::CreateUserRequest;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 30;
pub const EMAIL_MIN: usize = 7;
pub const EMAIL_MAX: usize = 254;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 72;

const CREATE_FIELDS: [&str; 3] = ["username", "email", "password"];

/// Create payload that passed every rule.
#[derive(Debug, Clone)]
pub struct ValidCreate {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, UserError> {
    let value = value.ok_or_else(|| UserError::validation(format!("\"{field}\" is required.")))?;
    if value.is_empty() {
        return Err(UserError::validation(format!("\"{field}\" cannot be blank.")));
    }
    Ok(value)
}

// Lengths are UTF-16 code units, the unit browsers and JSON clients count in.
fn length(field: &str, value: &str, min: usize, max: usize) -> Result<(), UserError> {
    let len = value.encode_utf16().count();
    if len < min {
        return Err(UserError::validation(format!(
            "\"{field}\" must be at least {min} characters long."
        )));
    }
    if len > max {
        return Err(UserError::validation(format!(
            "\"{field}\" must be at most {max} characters long."
        )));
    }
    Ok(())
}

pub fn validate_username(value: Option<&str>) -> Result<&str, UserError> {
    let username = required("username", value)?;
    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(UserError::validation(
            "\"username\" must only contain alphanumeric characters.",
        ));
    }
    length("username", username, USERNAME_MIN, USERNAME_MAX)?;
    Ok(username)
}

pub fn validate_email(value: Option<&str>) -> Result<&str, UserError> {
    let email = required("email", value)?;
    if !is_valid_email(email) {
        return Err(UserError::validation("\"email\" must be a valid email."));
    }
    length("email", email, EMAIL_MIN, EMAIL_MAX)?;
    Ok(email)
}

pub fn validate_password(value: Option<&str>) -> Result<&str, UserError> {
    let password = required("password", value)?;
    length("password", password, PASSWORD_MIN, PASSWORD_MAX)?;
    Ok(password)
}

/// Validate a create payload, returning the first violation found.
pub fn validate_create(req: &CreateUserRequest) -> Result<ValidCreate, UserError> {
    let username = validate_username(req.username.as_deref())?;
    let email = validate_email(req.email.as_deref())?;
    let password = validate_password(req.password.as_deref())?;
    Ok(ValidCreate {
        username: username.to_owned(),
        email: email.to_owned(),
        password: password.to_owned(),
    })
}

fn string_field<'a>(body: &'a Map<String, Value>, field: &str) -> Result<Option<&'a str>, UserError> {
    match body.get(field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(UserError::validation(format!("\"{field}\" must be a string."))),
    }
}

/// Validate a raw JSON create body. Each known field is type-checked and
/// then checked against its rules, in order; unknown keys are reported last.
pub fn validate_create_body(body: &Value) -> Result<CreateUserRequest, UserError> {
    let Value::Object(map) = body else {
        return Err(UserError::validation("\"value\" must be an object."));
    };
    let username = validate_username(string_field(map, "username")?)?;
    let email = validate_email(string_field(map, "email")?)?;
    let password = validate_password(string_field(map, "password")?)?;
    if let Some(key) = map.keys().find(|k| !CREATE_FIELDS.contains(&k.as_str())) {
        return Err(UserError::validation(format!("\"{key}\" is not allowed.")));
    }
    Ok(CreateUserRequest {
        username: Some(username.to_owned()),
        email: Some(email.to_owned()),
        password: Some(password.to_owned()),
    })
}
