pub mod aggregate;
pub mod analysis;
pub mod error;
pub mod ingest;
pub mod intersection;
pub mod output;
