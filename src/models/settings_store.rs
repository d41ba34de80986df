//! SQLite-backed store for user settings and resolved thumbnail ratios.
//!
//! This module provides the `SettingsStore` struct which persists:
//! - The grid density setting (`grid_mode` = `"more"` | `"less"`)
//! - Thumbnail dimensions per image url, so later sessions skip probing

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::layout::GridDensity;

const GRID_MODE_KEY: &str = "grid_mode";

/// SQLite storage for settings and the ratio cache.
///
/// The database is stored at `XDG_CONFIG_HOME/gallerow/settings.sqlite` and
/// uses WAL mode.
pub struct SettingsStore {
    conn: Connection,
}

/// Thumbnail dimensions cached for one image url.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedDimensions {
    pub width: u32,
    pub height: u32,
}

impl CachedDimensions {
    pub fn ratio(&self) -> Option<f32> {
        crate::models::ratio_from_dimensions(self.width, self.height)
    }
}

impl SettingsStore {
    /// Opens or creates the database at the default XDG location.
    pub fn open_default() -> Result<Self> {
        let db_path = Self::default_db_path()?;
        Self::open_or_recover(&db_path)
    }

    /// Opens the database, moving an unreadable file aside and starting
    /// fresh when the first open fails.
    pub fn open_or_recover(path: &Path) -> Result<Self> {
        match Self::open(path) {
            Ok(store) => Ok(store),
            Err(e) => {
                warn!(error = ?e, "Failed to open settings database");
                Self::handle_corruption(path)
            }
        }
    }

    /// Returns the default database path based on XDG directories.
    pub fn default_db_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "gallerow")
            .context("Failed to determine project directories")?;

        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)
            .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;

        Ok(config_dir.join("settings.sqlite"))
    }

    /// Opens or creates the database at the specified path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {:?}", path))?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )
        .context("Failed to configure SQLite pragmas")?;

        let store = Self { conn };
        store.create_tables()?;

        info!("Opened settings store at {:?}", path);
        Ok(store)
    }

    fn create_tables(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS thumb_dims (
                url TEXT PRIMARY KEY NOT NULL,
                width INTEGER NOT NULL,
                height INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            ",
            )
            .context("Failed to create database tables")?;

        debug!("Settings tables created/verified");
        Ok(())
    }

    // =========================================================================
    // Settings
    // =========================================================================

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query setting")
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "
            INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
                params![key, value, Self::now()],
            )
            .context("Failed to store setting")?;
        Ok(())
    }

    /// Reads the persisted grid density. Missing or unknown values fall back
    /// to `GridDensity::Less`.
    pub fn grid_density(&self) -> Result<GridDensity> {
        let Some(raw) = self.get_setting(GRID_MODE_KEY)? else {
            return Ok(GridDensity::default());
        };
        match raw.parse() {
            Ok(density) => Ok(density),
            Err(err) => {
                warn!(error = %err, "Ignoring stored grid mode");
                Ok(GridDensity::default())
            }
        }
    }

    pub fn set_grid_density(&self, density: GridDensity) -> Result<()> {
        self.set_setting(GRID_MODE_KEY, density.as_str())
    }

    // =========================================================================
    // Ratio cache
    // =========================================================================

    /// Looks up cached thumbnail dimensions for the given urls.
    pub fn get_dimensions_batch(&self, urls: &[&str]) -> Result<HashMap<String, CachedDimensions>> {
        let mut found = HashMap::with_capacity(urls.len());
        if urls.is_empty() {
            return Ok(found);
        }

        let mut stmt = self
            .conn
            .prepare_cached("SELECT width, height FROM thumb_dims WHERE url = ?1")?;

        for url in urls {
            let dims = stmt
                .query_row(params![url], |row| {
                    Ok(CachedDimensions {
                        width: row.get(0)?,
                        height: row.get(1)?,
                    })
                })
                .optional()
                .context("Failed to query thumbnail dimensions")?;
            if let Some(dims) = dims {
                found.insert((*url).to_string(), dims);
            }
        }

        Ok(found)
    }

    /// Stores thumbnail dimensions in a single transaction.
    pub fn put_dimensions_batch(&mut self, entries: &[(String, CachedDimensions)]) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let now = Self::now();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "
                INSERT INTO thumb_dims (url, width, height, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(url) DO UPDATE SET
                    width = excluded.width,
                    height = excluded.height,
                    updated_at = excluded.updated_at
                ",
            )?;
            for (url, dims) in entries {
                stmt.execute(params![url, dims.width, dims.height, now])?;
            }
        }
        tx.commit()?;

        debug!("Stored {} thumbnail dimensions", entries.len());
        Ok(entries.len())
    }

    pub fn count_dimensions(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM thumb_dims", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Returns the current Unix timestamp.
    pub fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }

    /// Moves a corrupted database aside and starts a fresh one.
    fn handle_corruption(path: &Path) -> Result<Self> {
        warn!("Handling potential database corruption at {:?}", path);

        let backup_path = path.with_extension("sqlite.corrupted");
        if path.exists() {
            std::fs::rename(path, &backup_path).with_context(|| {
                format!("Failed to backup corrupted database to {:?}", backup_path)
            })?;
            warn!("Backed up corrupted database to {:?}", backup_path);
        }

        Self::open(path)
    }
}
