//! Repository för användare

use std::sync::{Arc, Mutex};

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::lock;
use crate::models::{Role, User};

const SELECT_COLUMNS: &str = "SELECT id, email, name, role, direktorat, subdirektorat, divisi,
        created_year, is_active
     FROM users";

pub struct UserRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UserRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub fn find_all(&self) -> Result<Vec<User>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY name", SELECT_COLUMNS))?;

        let users = stmt
            .query_map([], |row| Ok(Self::row_to_user(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(users)
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = lock(&self.conn)?;
        let user = conn
            .query_row(
                &format!("{} WHERE lower(email) = lower(?)", SELECT_COLUMNS),
                [email],
                |row| Ok(Self::row_to_user(row)),
            )
            .optional()?;

        Ok(user)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let conn = lock(&self.conn)?;
        let user = conn
            .query_row(&format!("{} WHERE id = ?", SELECT_COLUMNS), [id], |row| {
                Ok(Self::row_to_user(row))
            })
            .optional()?;

        Ok(user)
    }

    /// Användare och lagrad lösenordshash för inloggning. Konton utan
    /// lösenord returneras med tom hash.
    pub fn find_credentials(&self, email: &str) -> Result<Option<(User, String)>> {
        let conn = lock(&self.conn)?;
        let found = conn
            .query_row(
                "SELECT id, email, name, role, direktorat, subdirektorat, divisi,
                        created_year, is_active, password_hash
                 FROM users WHERE lower(email) = lower(?)",
                [email],
                |row| {
                    let hash: Option<String> = row.get(9)?;
                    Ok((Self::row_to_user(row), hash.unwrap_or_default()))
                },
            )
            .optional()?;

        Ok(found)
    }

    /// Returnerar false om användaren saknas
    pub fn set_password_hash(&self, id: i64, hash: &str) -> Result<bool> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute(
            "UPDATE users SET password_hash = ? WHERE id = ?",
            params![hash, id],
        )?;
        Ok(affected > 0)
    }

    pub fn create(&self, user: &mut User) -> Result<i64> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO users (email, name, role, direktorat, subdirektorat, divisi, created_year,
                is_active)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                user.email,
                user.name,
                user.role.to_string(),
                user.direktorat,
                user.subdirektorat,
                user.divisi,
                user.created_year,
                user.is_active,
            ],
        )?;

        let id = conn.last_insert_rowid();
        user.id = Some(id);
        Ok(id)
    }

    /// Returnerar false om användaren saknas
    pub fn update(&self, user: &User) -> Result<bool> {
        let Some(id) = user.id else {
            return Ok(false);
        };

        let conn = lock(&self.conn)?;
        let affected = conn.execute(
            "UPDATE users SET email = ?, name = ?, role = ?, direktorat = ?, subdirektorat = ?,
                divisi = ?, created_year = ?, is_active = ?
             WHERE id = ?",
            params![
                user.email,
                user.name,
                user.role.to_string(),
                user.direktorat,
                user.subdirektorat,
                user.divisi,
                user.created_year,
                user.is_active,
                id,
            ],
        )?;

        Ok(affected > 0)
    }

    pub fn delete(&self, id: i64) -> Result<bool> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute("DELETE FROM users WHERE id = ?", [id])?;
        Ok(affected > 0)
    }

    fn row_to_user(row: &Row) -> User {
        let role: String = row.get(3).unwrap_or_default();
        User {
            id: row.get(0).ok(),
            email: row.get(1).unwrap_or_default(),
            name: row.get(2).unwrap_or_default(),
            role: Role::from_db_str(&role),
            direktorat: row.get(4).ok().flatten(),
            subdirektorat: row.get(5).ok().flatten(),
            divisi: row.get(6).ok().flatten(),
            created_year: row.get(7).ok().flatten(),
            is_active: row.get(8).unwrap_or(true),
        }
    }
}
