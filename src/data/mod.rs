//! Data ingestion, storage, and partitioning

pub mod dataset;
pub mod ingest;
pub mod store;

pub use dataset::{stratified_split, TrainTestSplit};
pub use store::{Store, StoreStats};
