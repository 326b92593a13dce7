//! Normalisation of the user profiles returned by the accounts API.
//!
//! The backend answers `/users/me/` with one of a few shapes. Each known shape is a variant of
//! [`UserPayload`]; anything else is rejected with a [`ProfileError`] instead of being guessed
//! at. A recognised record is then mapped onto [`AppUser`], taking each field from the record
//! itself first and then from its nested `user` and `profile` objects.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Reasons a profile payload is rejected.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile payload is not a JSON object")]
    NotAnObject,

    #[error("profile payload does not match a known shape: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("profile has no user id")]
    MissingId,

    #[error("profile user id {0:?} is not a number")]
    InvalidId(String),

    #[error("profile has no email address")]
    MissingEmail,
}

/// Access level derived from the free-text role.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Entreprise,
    #[default]
    Utilisateur,
}

impl Role {
    /// Classifies a role label by keyword, case-insensitively.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        let contains_any = |keywords: &[&str]| keywords.iter().any(|k| label.contains(k));
        if contains_any(&["admin", "superuser", "super", "staff"]) {
            Self::Admin
        } else if contains_any(&["entreprise", "company", "vendor"]) {
            Self::Entreprise
        } else {
            Self::Utilisateur
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Entreprise => "entreprise",
            Self::Utilisateur => "utilisateur",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signed-in user as the rest of the application sees it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppUser {
    pub id: u64,
    pub email: String,
    pub username: Option<String>,
    pub role: Role,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl AppUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A user id sent either as a number or as a numeric string.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Number(u64),
    Text(String),
}

impl IdValue {
    fn parse(&self) -> Result<u64, ProfileError> {
        match self {
            Self::Number(id) => Ok(*id),
            Self::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| ProfileError::InvalidId(text.clone())),
        }
    }
}

/// A capability flag sent as a boolean, a number or a word.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl Flag {
    pub fn is_set(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Number(value) => *value != 0,
            Self::Text(text) => matches!(
                text.trim().to_lowercase().as_str(),
                "true" | "1" | "yes" | "y"
            ),
        }
    }
}

/// Secondary objects (`user`, `profile`) nested in a record.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct NestedRecord {
    #[serde(default)]
    pub id: Option<IdValue>,
    #[serde(default)]
    pub user_id: Option<IdValue>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_staff: Option<Flag>,
    #[serde(default)]
    pub is_superuser: Option<Flag>,
}

/// A user record as sent by the backend.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub id: Option<IdValue>,
    #[serde(default)]
    pub user_id: Option<IdValue>,
    #[serde(default)]
    pub pk: Option<IdValue>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub mail: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_staff: Option<Flag>,
    #[serde(default)]
    pub is_superuser: Option<Flag>,
    #[serde(default)]
    pub user: Option<NestedRecord>,
    #[serde(default)]
    pub profile: Option<NestedRecord>,
}

/// The payload shapes the accounts API is known to send.
#[derive(Clone, Debug, PartialEq)]
pub enum UserPayload {
    /// `{ "data": { ...record } }`
    Data(UserRecord),
    /// `{ "user": { ...record } }`
    User(UserRecord),
    /// The record itself.
    Flat(UserRecord),
}

impl UserPayload {
    /// Recognises the shape of `value`.
    ///
    /// A `data` object takes precedence over a `user` object, which takes precedence over the
    /// top-level fields.
    pub fn from_value(value: Value) -> Result<Self, ProfileError> {
        let Value::Object(mut map) = value else {
            return Err(ProfileError::NotAnObject);
        };

        if let Some(data) = take_object(&mut map, "data") {
            return Ok(Self::Data(serde_json::from_value(data)?));
        }
        if let Some(user) = take_object(&mut map, "user") {
            return Ok(Self::User(serde_json::from_value(user)?));
        }
        Ok(Self::Flat(serde_json::from_value(Value::Object(map))?))
    }

    pub fn record(&self) -> &UserRecord {
        match self {
            Self::Data(record) | Self::User(record) | Self::Flat(record) => record,
        }
    }

    /// Maps the recognised record onto an [`AppUser`].
    pub fn into_user(self) -> Result<AppUser, ProfileError> {
        let record = self.record();
        let nested = record.user.as_ref();
        let profile = record.profile.as_ref();

        let id = first([
            record.id.as_ref(),
            record.user_id.as_ref(),
            record.pk.as_ref(),
            nested.and_then(|u| u.id.as_ref()),
            nested.and_then(|u| u.user_id.as_ref()),
            profile.and_then(|p| p.id.as_ref()),
        ])
        .ok_or(ProfileError::MissingId)?
        .parse()?;

        let email = [
            record.email.as_ref(),
            nested.and_then(|u| u.email.as_ref()),
            profile.and_then(|p| p.email.as_ref()),
            record.email_address.as_ref(),
            record.mail.as_ref(),
        ]
        .into_iter()
        .flatten()
        .find(|email| !email.is_empty())
        .ok_or(ProfileError::MissingEmail)?
        .clone();

        let username = [
            record.username.as_ref(),
            nested.and_then(|u| u.username.as_ref()),
            profile.and_then(|p| p.username.as_ref()),
            record.name.as_ref(),
            record.login.as_ref(),
        ]
        .into_iter()
        .flatten()
        .find(|name| !name.is_empty())
        .cloned();

        let role = first([
            record.role.as_ref(),
            nested.and_then(|u| u.role.as_ref()),
            profile.and_then(|p| p.role.as_ref()),
        ])
        .map_or(Role::Utilisateur, |label| Role::from_label(label));

        let flag = |own: Option<&Flag>, pick: fn(&NestedRecord) -> Option<&Flag>| {
            first([own, nested.and_then(pick), profile.and_then(pick)])
                .is_some_and(Flag::is_set)
        };

        Ok(AppUser {
            id,
            email,
            username,
            role,
            is_staff: flag(record.is_staff.as_ref(), |n| n.is_staff.as_ref()),
            is_superuser: flag(record.is_superuser.as_ref(), |n| n.is_superuser.as_ref()),
        })
    }
}

fn take_object(map: &mut Map<String, Value>, key: &str) -> Option<Value> {
    if map.get(key).is_some_and(Value::is_object) {
        map.remove(key)
    } else {
        None
    }
}

fn first<T, const N: usize>(candidates: [Option<T>; N]) -> Option<T> {
    candidates.into_iter().flatten().next()
}

/// Recognises a profile payload and maps it onto an [`AppUser`].
pub fn normalize_user(value: Value) -> Result<AppUser, ProfileError> {
    UserPayload::from_value(value)?.into_user()
}
