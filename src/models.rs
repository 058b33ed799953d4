use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<NaiveDate>,
}

/// Stored shape of a user: the public profile plus the credential hash.
/// Kept separate from `User` so responses and tweet snapshots never carry
/// the hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// Body for signup, login and user update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRegister {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub birthdate: Option<NaiveDate>,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    pub tweet_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Author snapshot taken at post time; later profile edits do not
    /// propagate into existing tweets.
    pub by: User,
}

/// Body for posting and updating a tweet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTweetRequest {
    pub tweet_id: Uuid,
    pub content: String,
    pub by: User,
}

impl UserRegister {
    pub fn validate(&self) -> Result<(), ApiError> {
        check_email("email", &self.email)?;
        check_len("first_name", &self.first_name, 1, 50)?;
        check_len("last_name", &self.last_name, 1, 50)?;
        check_len("password", &self.password, 8, 64)?;
        Ok(())
    }

    /// The public profile carried by responses and tweet snapshots.
    pub fn profile(&self) -> User {
        User {
            user_id: self.user_id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            birthdate: self.birthdate,
        }
    }
}

impl User {
    pub fn validate(&self) -> Result<(), ApiError> {
        check_email("email", &self.email)?;
        check_len("first_name", &self.first_name, 1, 50)?;
        check_len("last_name", &self.last_name, 1, 50)?;
        Ok(())
    }
}

impl CreateTweetRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        check_len("content", &self.content, 1, 280)?;
        self.by.validate()
    }
}

// Bounds count characters, not bytes.
fn check_len(field: &'static str, value: &str, min: usize, max: usize) -> Result<(), ApiError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ApiError::Validation {
            field,
            reason: format!("length must be {min}..={max} characters, got {len}"),
        });
    }
    Ok(())
}

fn check_email(field: &'static str, value: &str) -> Result<(), ApiError> {
    let well_formed = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !well_formed {
        return Err(ApiError::Validation {
            field,
            reason: format!("{value:?} is not a valid email address"),
        });
    }
    Ok(())
}
