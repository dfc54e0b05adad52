//! Lokalt sessionstillstånd (inloggad användare, token, migreringsflagga)

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionKey {
    User,
    Token,
    Migrated,
}

impl SessionKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Token => "token",
            Self::Migrated => "migrated",
        }
    }
}

#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    values: BTreeMap<String, Value>,
}

impl SessionStore {
    /// Öppna sessionsfilen. En saknad eller trasig fil ger en tom session.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ogiltig sessionsfil {:?}: {}", path, e);
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };

        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get<T: DeserializeOwned>(&self, key: SessionKey) -> Option<T> {
        self.values
            .get(key.as_str())
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn set<T: Serialize>(&mut self, key: SessionKey, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.values.insert(key.as_str().to_string(), value);
        self.save()
    }

    pub fn remove(&mut self, key: SessionKey) -> Result<bool> {
        let removed = self.values.remove(key.as_str()).is_some();
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Kunde inte skriva session {:?}", self.path))?;
        Ok(())
    }

    pub fn user(&self) -> Option<User> {
        self.get(SessionKey::User)
    }

    pub fn set_user(&mut self, user: &User) -> Result<()> {
        self.set(SessionKey::User, user)
    }

    pub fn token(&self) -> Option<String> {
        self.get(SessionKey::Token)
    }

    pub fn set_token(&mut self, token: &str) -> Result<()> {
        self.set(SessionKey::Token, &token)
    }

    pub fn is_migrated(&self) -> bool {
        self.get(SessionKey::Migrated).unwrap_or(false)
    }

    pub fn mark_migrated(&mut self) -> Result<()> {
        self.set(SessionKey::Migrated, &true)
    }

    /// Logga ut: användare och token tas bort, migreringsflaggan behålls
    pub fn clear_session(&mut self) -> Result<()> {
        self.values.remove(SessionKey::User.as_str());
        self.values.remove(SessionKey::Token.as_str());
        self.save()
    }
}
