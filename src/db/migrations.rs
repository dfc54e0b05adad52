use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

use super::schema::{CREATE_AOI_TABLES, CREATE_TABLES, SCHEMA_VERSION};

/// Kör alla nödvändiga migrationer
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_current_version(conn)?;

    if current_version == 0 {
        // Ny databas - skapa allt
        info!("Skapar ny databas med schema version {}", SCHEMA_VERSION);
        initial_setup(conn)?;
    } else if current_version < SCHEMA_VERSION {
        // Uppdatera befintlig databas
        info!(
            "Migrerar databas från version {} till {}",
            current_version, SCHEMA_VERSION
        );
        migrate_from(conn, current_version)?;
    } else {
        info!("Databas är uppdaterad (version {})", current_version);
    }

    Ok(())
}

fn get_current_version(conn: &Connection) -> Result<i32> {
    // Kontrollera om schema_migrations-tabellen finns
    let table_exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_migrations')",
        [],
        |row| row.get(0),
    )?;

    if !table_exists {
        return Ok(0);
    }

    // Hämta senaste version
    let version: Option<i32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))
        .ok()
        .flatten();

    Ok(version.unwrap_or(0))
}

fn initial_setup(conn: &Connection) -> Result<()> {
    // Skapa alla tabeller
    conn.execute_batch(CREATE_TABLES)?;
    conn.execute_batch(CREATE_AOI_TABLES)?;

    // Markera migration som klar
    conn.execute(
        "INSERT INTO schema_migrations (version) VALUES (?)",
        [SCHEMA_VERSION],
    )?;

    info!("Initial setup klar");
    Ok(())
}

fn migrate_from(conn: &Connection, from_version: i32) -> Result<()> {
    // Kör migrationer stegvis
    for version in (from_version + 1)..=SCHEMA_VERSION {
        match version {
            2 => migrate_v1_to_v2(conn)?,
            3 => migrate_v2_to_v3(conn)?,
            _ => {}
        }

        // Markera version som migrerad
        conn.execute(
            "INSERT INTO schema_migrations (version) VALUES (?)",
            [version],
        )?;

        info!("Migrerade till version {}", version);
    }

    Ok(())
}

/// Migration v1 -> v2: manuell penjelasan per bedömningsrad
fn migrate_v1_to_v2(conn: &Connection) -> Result<()> {
    info!("Migration v2: Lägger till classification_override i assessment_rows");

    conn.execute_batch("ALTER TABLE assessment_rows ADD COLUMN classification_override TEXT;")?;

    Ok(())
}

/// Migration v2 -> v3: inloggning och Area of Improvement
fn migrate_v2_to_v3(conn: &Connection) -> Result<()> {
    info!("Migration v3: Lösenord för användare och AOI-tabeller");

    // Befintliga konton är aktiva men saknar lösenord tills ett sätts
    conn.execute_batch(
        "ALTER TABLE users ADD COLUMN password_hash TEXT;
         ALTER TABLE users ADD COLUMN is_active INTEGER NOT NULL DEFAULT 1;",
    )?;

    conn.execute_batch(CREATE_AOI_TABLES)?;

    Ok(())
}
