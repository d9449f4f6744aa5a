//! SalesPulse Ingestion
//!
//! Batch ingestion of delimited sales-transaction files into the
//! normalized relational schema: per-record dimension resolution
//! (category, region, customer, product) followed by one order fact
//! row per input record.

pub mod pipeline;
pub mod record;

pub use pipeline::{IngestMode, IngestReport, IngestionPipeline, RowFailure};
pub use record::RawSaleRecord;
