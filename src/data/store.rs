//! SQLite record store gateway
//!
//! Thin wrapper over the tabular store. Owns the raw season table and the
//! schema; the feature view is created here but conceptually belongs to the
//! upstream feature layer, and this pipeline only ever reads it.

use crate::{FeatureRecord, Result, SeasonRecord};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Raw season table, fully replaced on every load
pub const SEASON_TABLE: &str = "player_season";
/// Upstream feature view read by the training pipeline
pub const FEATURE_VIEW: &str = "player_season_features";

/// Store connection and operations
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create the store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Store { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Store { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize schema: the raw table plus the feature view.
    ///
    /// Ratios are relative to a nominal 38-match league season; the season
    /// start year is the leading integer of the season string ("1992-93").
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS player_season (
                season TEXT NOT NULL,
                competition TEXT NOT NULL,
                club TEXT NOT NULL,
                appearances INTEGER NOT NULL,
                starts INTEGER NOT NULL,
                ppg REAL,
                minutes INTEGER NOT NULL
            );

            CREATE VIEW IF NOT EXISTS player_season_features AS
            SELECT
                season,
                club,
                competition,
                appearances,
                starts,
                ppg,
                minutes,
                appearances / 38.0 AS appearance_ratio,
                minutes / (38.0 * 90.0) AS minutes_ratio,
                CAST(substr(season, 1, 4) AS INTEGER) AS season_start_year
            FROM player_season;
            "#,
        )?;
        Ok(())
    }

    // ==================== Load Operations ====================

    /// Replace the season table with the given rows, atomically.
    ///
    /// Truncates, then inserts rows one at a time in source order inside a
    /// single transaction. The first error (parse or store) rolls the whole
    /// batch back, leaving the table exactly as it was before the call.
    pub fn replace_seasons<I>(&mut self, rows: I) -> Result<usize>
    where
        I: IntoIterator<Item = Result<SeasonRecord>>,
    {
        let tx = self.conn.transaction()?;
        let mut count = 0;
        {
            tx.execute("DELETE FROM player_season", [])?;
            let mut stmt = tx.prepare(
                "INSERT INTO player_season
                 (season, competition, club, appearances, starts, ppg, minutes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for row in rows {
                let record = row?;
                stmt.execute(params![
                    record.season,
                    record.competition,
                    record.club,
                    record.appearances,
                    record.starts,
                    record.ppg,
                    record.minutes,
                ])?;
                count += 1;
            }
        }
        tx.commit()?;
        Ok(count)
    }

    // ==================== Read Operations ====================

    /// Read the full feature view, ordered by season start year.
    pub fn fetch_features(&self) -> Result<Vec<FeatureRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT season, club, competition, appearances, starts, ppg, minutes,
                    appearance_ratio, minutes_ratio, season_start_year
             FROM player_season_features
             ORDER BY season_start_year",
        )?;

        let records = stmt
            .query_map([], |row| {
                Ok(FeatureRecord {
                    season: row.get(0)?,
                    club: row.get(1)?,
                    competition: row.get(2)?,
                    appearances: row.get(3)?,
                    starts: row.get(4)?,
                    ppg: row.get(5)?,
                    minutes: row.get(6)?,
                    appearance_ratio: row.get(7)?,
                    minutes_ratio: row.get(8)?,
                    season_start_year: row.get(9)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Read the raw season rows back in insertion order (diagnostics, tests)
    pub fn fetch_seasons(&self) -> Result<Vec<SeasonRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT season, competition, club, appearances, starts, ppg, minutes
             FROM player_season",
        )?;

        let records = stmt
            .query_map([], |row| {
                Ok(SeasonRecord {
                    season: row.get(0)?,
                    competition: row.get(1)?,
                    club: row.get(2)?,
                    appearances: row.get(3)?,
                    starts: row.get(4)?,
                    ppg: row.get(5)?,
                    minutes: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    // ==================== Statistics ====================

    /// Store statistics for `data status`
    pub fn stats(&self) -> Result<StoreStats> {
        let season_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM player_season", [], |row| row.get(0))?;

        let earliest: Option<String> = self
            .conn
            .query_row("SELECT MIN(season) FROM player_season", [], |row| {
                row.get(0)
            })
            .optional()?
            .flatten();

        let latest: Option<String> = self
            .conn
            .query_row("SELECT MAX(season) FROM player_season", [], |row| {
                row.get(0)
            })
            .optional()?
            .flatten();

        Ok(StoreStats {
            season_count: season_count as usize,
            earliest_season: earliest,
            latest_season: latest,
        })
    }
}

/// Store statistics
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub season_count: usize,
    pub earliest_season: Option<String>,
    pub latest_season: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PipelineError;

    fn record(season: &str, minutes: u32, ppg: Option<f64>) -> SeasonRecord {
        SeasonRecord {
            season: season.to_string(),
            competition: "Eredivisie".to_string(),
            club: "Ajax".to_string(),
            appearances: 30,
            starts: 28,
            ppg,
            minutes,
        }
    }

    #[test]
    fn test_create_store() {
        let store = Store::in_memory().unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.season_count, 0);
        assert!(stats.earliest_season.is_none());
    }

    #[test]
    fn test_replace_seasons() {
        let mut store = Store::in_memory().unwrap();
        let rows = vec![
            Ok(record("1992-93", 2700, Some(0.52))),
            Ok(record("1993-94", 2430, None)),
        ];
        let count = store.replace_seasons(rows).unwrap();
        assert_eq!(count, 2);

        let stored = store.fetch_seasons().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].season, "1992-93");
        assert_eq!(stored[1].ppg, None);

        // A second load fully replaces the first
        let count = store
            .replace_seasons(vec![Ok(record("1995-96", 1800, Some(0.9)))])
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(store.stats().unwrap().season_count, 1);
    }

    #[test]
    fn test_replace_rolls_back_on_error() {
        let mut store = Store::in_memory().unwrap();
        store
            .replace_seasons(vec![Ok(record("1992-93", 2700, Some(0.5)))])
            .unwrap();

        let rows: Vec<crate::Result<SeasonRecord>> = vec![
            Ok(record("1993-94", 2400, None)),
            Err(PipelineError::Parse("bad appearances".to_string())),
            Ok(record("1994-95", 2500, None)),
        ];
        assert!(store.replace_seasons(rows).is_err());

        // Pre-load content is untouched
        let stored = store.fetch_seasons().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].season, "1992-93");
    }

    #[test]
    fn test_feature_view() {
        let mut store = Store::in_memory().unwrap();
        let mut first = record("1992-93", 38 * 90, Some(0.52));
        first.appearances = 38;
        store
            .replace_seasons(vec![Ok(first), Ok(record("1990-91", 1710, None))])
            .unwrap();

        let features = store.fetch_features().unwrap();
        assert_eq!(features.len(), 2);
        // Ordered by season start year, not insertion order
        assert_eq!(features[0].season_start_year, 1990);
        assert_eq!(features[1].season_start_year, 1992);
        assert!((features[1].appearance_ratio - 1.0).abs() < 1e-9);
        assert!((features[1].minutes_ratio - 1.0).abs() < 1e-9);
        assert!((features[0].minutes_ratio - 0.5).abs() < 1e-9);
        assert_eq!(features[0].ppg, None);
    }
}
