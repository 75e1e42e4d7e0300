use derives::Names;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
    error::{Result, ValidationErrors},
    types::lenient,
};

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Library references come back either as ids or as populated documents.
fn library_ids<'de, D>(d: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(d)? {
        Value::Array(items) => items,
        _ => return Ok(vec![]),
    };
    Ok(items
        .into_iter()
        .filter_map(|x| match x {
            Value::String(s) => Some(s),
            Value::Object(mut map) => match map.remove("_id") {
                Some(Value::String(s)) => Some(s),
                _ => None,
            },
            _ => None,
        })
        .collect())
}

#[derive(Names, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id:      String,
    #[serde(default, deserialize_with = "lenient::string_or_null")]
    pub email:   String,
    #[serde(default, deserialize_with = "lenient::string_or_null")]
    pub name:    String,
    /// Avatar URL.
    #[serde(default, deserialize_with = "lenient::string_or_null")]
    pub image:   String,
    #[serde(default, deserialize_with = "lenient::string_or_null")]
    pub role:    String,
    #[serde(default, deserialize_with = "library_ids")]
    pub library: Vec<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        match self.name.trim() {
            "" => &self.email,
            name => name,
        }
    }
}

/// Response of `POST /auth/login`, kept for the lifetime of the login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user:         User,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email:    String,
    pub password: String,
}

/// Response of `POST /cloudinary/upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub image_url: String,
}

/// Changes from the profile editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name:                  String,
    pub email:                 String,
    pub password:              Option<String>,
    pub password_confirmation: Option<String>,
}

impl ProfileUpdate {
    pub fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            ..Self::default()
        }
    }

    pub fn errors(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.name.trim().is_empty() {
            errors.push("name", "Name is required");
        }
        if self.email.trim().is_empty() {
            errors.push("email", "Email is required");
        } else if !EMAIL_PATTERN.is_match(self.email.trim()) {
            errors.push("email", "Email is not valid");
        }
        if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
            if password.chars().count() < MIN_PASSWORD_LENGTH {
                errors.push(
                    "password",
                    format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
                );
            }
            if self.password_confirmation.as_deref() != Some(password) {
                errors.push("passwordConfirmation", "Passwords do not match");
            }
            // Profile edits never reach the backend, so a new password would be lost.
            errors.push("password", "Password changes are not supported by the server");
        }
        errors
    }

    pub fn validate(&self) -> Result<()> {
        self.errors().into_result()
    }

    pub fn apply(&self, user: &mut User) {
        user.name = self.name.trim().to_string();
        user.email = self.email.trim().to_string();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn decodes_login_response() {
        let session: Session = serde_json::from_str(
            r#"{
                "access_token": "jwt",
                "user": {
                    "_id": "u-1",
                    "email": "ana@example.com",
                    "name": "Ana",
                    "image": null,
                    "role": "user",
                    "library": ["lib-1", {"_id": "lib-2", "wishlist": true}]
                }
            }"#,
        )
        .unwrap();
        assert_eq!(session.user.library, vec!["lib-1", "lib-2"]);
        assert_eq!(session.user.image, "");
        assert!(!format!("{session:?}").contains("jwt"));
    }

    #[test]
    fn profile_validation() {
        let update = ProfileUpdate {
            name:                  " ".into(),
            email:                 "ana@example".into(),
            password:              Some("abc".into()),
            password_confirmation: Some("abd".into()),
        };
        let errors = update.errors();
        assert_eq!(errors.for_field("name").len(), 1);
        assert_eq!(errors.for_field("email"), vec!["Email is not valid"]);
        assert_eq!(errors.for_field("password").len(), 2);
        assert_eq!(errors.for_field("passwordConfirmation").len(), 1);

        let update = ProfileUpdate {
            name:                  "Ana".into(),
            email:                 "ana@example.com".into(),
            ..ProfileUpdate::default()
        };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn password_change_is_refused() {
        let update = ProfileUpdate {
            name:                  "Ana".into(),
            email:                 "ana@example.com".into(),
            password:              Some("secret1".into()),
            password_confirmation: Some("secret1".into()),
        };
        assert_eq!(
            update.errors().for_field("password"),
            vec!["Password changes are not supported by the server"]
        );
        assert!(update.validate().is_err());
    }

    #[test]
    fn password_is_optional() {
        let user = User {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            ..User::default()
        };
        assert!(ProfileUpdate::from_user(&user).validate().is_ok());
    }
}
