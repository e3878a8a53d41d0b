// crates/orbit-services/src/user.rs

use chrono::{DateTime, Utc};
use orbit_core::ValidationErrors;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

impl NewUser {
    /// Trimmed name and lowercased email, or the field errors.
    pub fn parse(name: &str, email: &str) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = errors.require_text("name", Some(name), "Name is required");
        let email = errors.require_text("email", Some(email), "Email is required");

        if let Some(email) = &email {
            if !email.contains('@') {
                errors.add("email", "Invalid email address");
            }
        }

        match (name, email) {
            (Some(name), Some(email)) => errors.into_result(Self {
                name,
                email: email.to_ascii_lowercase(),
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_parse_normalizes_email() {
        let user = NewUser::parse(" Asha ", "Asha@Studio.IO").unwrap();
        assert_eq!(user.name, "Asha");
        assert_eq!(user.email, "asha@studio.io");
    }

    #[test]
    fn test_parse_rejects_bad_email() {
        let errors = NewUser::parse("Asha", "asha.studio.io").unwrap_err();
        assert_eq!(errors.for_field("email"), vec!["Invalid email address"]);
    }
}
