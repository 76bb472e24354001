//! CSV ingestion into the record store
//!
//! Streams rows from a delimited source file straight into a full-replace
//! load. An empty `ppg` field is stored as NULL; a malformed numeric field
//! anywhere in the file fails the whole batch and leaves the store as it was.

use crate::data::Store;
use crate::{Result, SeasonRecord};
use std::path::Path;

/// Load a season CSV into the store, replacing all existing rows.
///
/// Expects a header row of `season, competition, club, appearances, starts,
/// ppg, minutes`. Returns the number of rows committed.
pub fn load_csv<P: AsRef<Path>>(store: &mut Store, path: P) -> Result<usize> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let rows = reader
        .deserialize::<SeasonRecord>()
        .map(|row| row.map_err(Into::into));
    store.replace_seasons(rows)
}
