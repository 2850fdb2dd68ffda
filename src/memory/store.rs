// src/memory/store.rs — SQLite operations

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;

/// Low-level SQLite operations for usage analytics.
pub struct Store {
    conn: Connection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymptomCountRow {
    pub symptom: String,
    pub count: i64,
}

/// Aggregate view rendered by the admin stats reply and the `stats` command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalyticsSummary {
    pub total_users: i64,
    pub active_today: i64,
    pub top_symptoms: Vec<SymptomCountRow>,
}

impl Store {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // -- Users --

    /// Count a new intake session for `user_id`, creating the row if needed.
    pub fn record_user(&self, user_id: &str) -> anyhow::Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO user_activity (user_id, sessions_count, last_active, created_at)
             VALUES (?1, 1, ?2, ?2)
             ON CONFLICT(user_id) DO UPDATE SET
                sessions_count = sessions_count + 1,
                last_active = excluded.last_active",
            params![user_id, now],
        )?;
        Ok(())
    }

    pub fn total_users(&self) -> anyhow::Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM user_activity", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn active_since(&self, since: DateTime<Utc>) -> anyhow::Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM user_activity WHERE last_active >= ?1",
            params![since.to_rfc3339()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // -- Symptoms --

    pub fn record_symptom(&self, symptom: &str) -> anyhow::Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO symptom_counts (symptom, count, last_seen)
             VALUES (?1, 1, ?2)
             ON CONFLICT(symptom) DO UPDATE SET
                count = count + 1,
                last_seen = excluded.last_seen",
            params![symptom, now],
        )?;
        Ok(())
    }

    pub fn top_symptoms(&self, limit: u32) -> anyhow::Result<Vec<SymptomCountRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT symptom, count FROM symptom_counts
             ORDER BY count DESC, symptom ASC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(SymptomCountRow {
                symptom: row.get(0)?,
                count: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // -- Aggregates --

    pub fn summary(&self, top_n: u32) -> anyhow::Result<AnalyticsSummary> {
        let midnight = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc())
            .unwrap_or_else(Utc::now);
        Ok(AnalyticsSummary {
            total_users: self.total_users()?,
            active_today: self.active_since(midnight)?,
            top_symptoms: self.top_symptoms(top_n)?,
        })
    }
}
