//! Lösenordshashning med bcrypt

use super::{AppError, AppResult};

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
// Lägsta tillåtna kostnad, annars blir testerna långsamma
#[cfg(test)]
const HASH_COST: u32 = 4;

pub fn hash_password(password: &str) -> AppResult<String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::validation(format!(
            "Lösenordet måste ha minst {} tecken",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(bcrypt::hash(password, HASH_COST)?)
}

/// En trasig hash räknas som fel lösenord
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!("Ogiltig lösenordshash: {}", e);
            false
        }
    }
}
