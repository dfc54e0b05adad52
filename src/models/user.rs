use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superadmin,
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "superadmin" => Self::Superadmin,
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Superadmin => write!(f, "superadmin"),
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
        }
    }
}

/// Användarkonto kopplat till en enhet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Option<i64>,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub direktorat: Option<String>,
    pub subdirektorat: Option<String>,
    pub divisi: Option<String>,
    /// År då kontot skapades för en specifik cykel (rensas med året)
    #[serde(rename = "createdYear")]
    pub created_year: Option<i32>,
    /// Inaktiva konton kan inte logga in
    #[serde(rename = "isActive", default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

impl User {
    pub fn new(email: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: None,
            email: email.into(),
            name: name.into(),
            role,
            direktorat: None,
            subdirektorat: None,
            divisi: None,
            created_year: None,
            is_active: true,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(format!("Ogiltig e-postadress: '{}'", self.email));
        }
        if self.name.trim().is_empty() {
            return Err("Namn måste anges".into());
        }
        Ok(())
    }
}

/// Svar på en lyckad inloggning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSession {
    pub user: User,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(User::new("admin@example.com", "Admin", Role::Admin).validate().is_ok());
        assert!(User::new("admin", "Admin", Role::Admin).validate().is_err());
        assert!(User::new("admin@example.com", " ", Role::Admin).validate().is_err());
    }

    #[test]
    fn test_missing_is_active_defaults_to_true() {
        let user: User = serde_json::from_str(
            r#"{"id": 3, "email": "a@example.com", "name": "A", "role": "admin",
                "direktorat": null, "subdirektorat": null, "divisi": null, "createdYear": null}"#,
        )
        .unwrap();
        assert!(user.is_active);
        assert_eq!(user.role, Role::Admin);
    }
}
