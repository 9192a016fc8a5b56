use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::{
    error::Result,
    lookup::DeviceRecord,
    storage::models::LookupRecord,
};

const API_KEY_SETTING: &str = "api_key";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS lookups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                imei TEXT NOT NULL,
                brand TEXT,
                model TEXT,
                os_hint TEXT NOT NULL,
                looked_up_at TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_lookups_imei ON lookups(imei)",
            [],
        )?;

        Ok(())
    }

    pub fn save_api_key(&self, key: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![API_KEY_SETTING, key],
        )?;
        Ok(())
    }

    pub fn load_api_key(&self) -> Result<Option<String>> {
        let key = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                [API_KEY_SETTING],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(key.filter(|k| !k.trim().is_empty()))
    }

    pub fn clear_api_key(&self) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM settings WHERE key = ?1", [API_KEY_SETTING])?;
        Ok(removed > 0)
    }

    pub fn save_lookup(&self, record: &DeviceRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO lookups (imei, brand, model, os_hint, looked_up_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.imei,
                record.brand,
                record.model,
                record.os_hint,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_history(&self, limit: Option<usize>) -> Result<Vec<LookupRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, imei, brand, model, os_hint, looked_up_at
             FROM lookups
             ORDER BY id DESC
             LIMIT ?1",
        )?;

        // SQLite treats a negative LIMIT as unbounded
        let limit = limit.map(|l| l as i64).unwrap_or(-1);

        let records = stmt
            .query_map([limit], |row| {
                let looked_up_at: String = row.get(5)?;
                Ok(LookupRecord {
                    id: row.get(0)?,
                    imei: row.get(1)?,
                    brand: row.get(2)?,
                    model: row.get(3)?,
                    os_hint: row.get(4)?,
                    looked_up_at: parse_timestamp(5, &looked_up_at)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let total_lookups: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM lookups",
            [],
            |row| row.get(0),
        )?;

        let distinct_devices: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT imei) FROM lookups",
            [],
            |row| row.get(0),
        )?;

        let distinct_brands: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT brand) FROM lookups WHERE brand IS NOT NULL",
            [],
            |row| row.get(0),
        )?;

        let last_lookup: Option<String> = self.conn.query_row(
            "SELECT MAX(looked_up_at) FROM lookups",
            [],
            |row| row.get(0),
        )?;

        Ok(DatabaseStats {
            total_lookups: total_lookups as usize,
            distinct_devices: distinct_devices as usize,
            distinct_brands: distinct_brands as usize,
            last_lookup: last_lookup
                .map(|ts| parse_timestamp(0, &ts))
                .transpose()?,
        })
    }
}

fn parse_timestamp(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e)))
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub total_lookups: usize,
    pub distinct_devices: usize,
    pub distinct_brands: usize,
    pub last_lookup: Option<DateTime<Utc>>,
}
