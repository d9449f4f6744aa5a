//! Ingestion pipeline
//!
//! Core logic for loading a sales export batch: per-record dimension
//! resolution through the repository, scalar coercion, and one order
//! fact row per record.

use crate::record::RawSaleRecord;
use csv::ReaderBuilder;
use salespulse_common::db::{CustomerAttrs, NewOrder, ProductAttrs, Repository};
use salespulse_common::errors::{AppError, Result};
use salespulse_common::metrics;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Failure policy for a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestMode {
    /// Abort the batch on the first failing record (default).
    /// Rows committed before the failure remain in place.
    #[default]
    Strict,

    /// Record per-row failures in the report and continue
    BestEffort,
}

/// A record that failed during a best-effort run
#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
    /// 1-based position of the record within the batch
    pub record: usize,
    pub message: String,
}

/// Outcome of one ingestion run
#[derive(Debug, Default, Serialize)]
pub struct IngestReport {
    /// Records that produced an order row
    pub records_ingested: usize,

    /// Distinct business keys resolved during this run, per dimension
    pub categories_resolved: usize,
    pub regions_resolved: usize,
    pub customers_resolved: usize,
    pub products_resolved: usize,

    /// Per-row failures (best-effort mode only)
    pub failures: Vec<RowFailure>,
}

/// Per-run cache of resolved business keys.
///
/// Dimension attributes are immutable after creation, so entries never
/// need invalidation within a run; the cache is dropped with the run.
#[derive(Default)]
struct DimensionCache {
    categories: HashMap<String, Uuid>,
    regions: HashMap<String, Uuid>,
    customers: HashMap<String, Uuid>,
    products: HashMap<String, Uuid>,
}

/// Ingestion pipeline
pub struct IngestionPipeline {
    repository: Repository,
    delimiter: u8,
}

impl IngestionPipeline {
    pub fn new(repository: Repository) -> Self {
        Self {
            repository,
            delimiter: b',',
        }
    }

    /// Override the field delimiter (defaults to comma)
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Ingest a delimited batch with a header row.
    ///
    /// Records are processed strictly in order, one at a time. The
    /// returned report describes what was committed; in strict mode an
    /// error identifies the first failing record and earlier rows stay
    /// committed.
    #[instrument(skip(self, reader), fields(mode = ?mode))]
    pub async fn ingest<R: Read>(&self, reader: R, mode: IngestMode) -> Result<IngestReport> {
        let started = Instant::now();

        let mut csv_reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut cache = DimensionCache::default();
        let mut report = IngestReport::default();

        for (index, row) in csv_reader.deserialize::<RawSaleRecord>().enumerate() {
            let record_no = index + 1;

            let outcome = match row {
                Ok(record) => {
                    self.ingest_record(&record, record_no, &mut cache, &mut report)
                        .await
                }
                Err(e) => Err(AppError::Validation {
                    message: format!("record {record_no}: {e}"),
                    field: None,
                }),
            };

            match outcome {
                Ok(()) => report.records_ingested += 1,
                Err(e) if mode == IngestMode::BestEffort => {
                    warn!(record = record_no, error = %e, "Record failed, continuing");
                    report.failures.push(RowFailure {
                        record: record_no,
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    metrics::record_ingest_run(
                        started.elapsed().as_secs_f64(),
                        report.records_ingested,
                        1,
                    );
                    return Err(e);
                }
            }
        }

        info!(
            records = report.records_ingested,
            failures = report.failures.len(),
            categories = report.categories_resolved,
            regions = report.regions_resolved,
            customers = report.customers_resolved,
            products = report.products_resolved,
            "Batch ingested"
        );

        metrics::record_ingest_run(
            started.elapsed().as_secs_f64(),
            report.records_ingested,
            report.failures.len(),
        );

        Ok(report)
    }

    /// Ingest a batch from a file on disk
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn ingest_path(&self, path: &Path, mode: IngestMode) -> Result<IngestReport> {
        let file = std::fs::File::open(path)?;
        self.ingest(std::io::BufReader::new(file), mode).await
    }

    async fn ingest_record(
        &self,
        record: &RawSaleRecord,
        record_no: usize,
        cache: &mut DimensionCache,
        report: &mut IngestReport,
    ) -> Result<()> {
        // Coerce scalars first so a malformed record writes nothing.
        let scalars = record.parse_scalars(record_no)?;

        let category_id = match cache.categories.get(&record.category) {
            Some(&id) => id,
            None => {
                let id = self
                    .repository
                    .resolve_or_create_category(&record.category)
                    .await?;
                cache.categories.insert(record.category.clone(), id);
                report.categories_resolved += 1;
                metrics::record_dimension_resolved("category");
                id
            }
        };

        let region_id = match cache.regions.get(&record.region) {
            Some(&id) => id,
            None => {
                let id = self
                    .repository
                    .resolve_or_create_region(&record.region)
                    .await?;
                cache.regions.insert(record.region.clone(), id);
                report.regions_resolved += 1;
                metrics::record_dimension_resolved("region");
                id
            }
        };

        let customer_id = match cache.customers.get(&record.customer_id) {
            Some(&id) => id,
            None => {
                let attrs = CustomerAttrs {
                    name: record.customer_name.clone(),
                    email: record.customer_email.clone(),
                    address: record.customer_address.clone(),
                };
                let id = self
                    .repository
                    .resolve_or_create_customer(&record.customer_id, &attrs)
                    .await?;
                cache.customers.insert(record.customer_id.clone(), id);
                report.customers_resolved += 1;
                metrics::record_dimension_resolved("customer");
                id
            }
        };

        let product_id = match cache.products.get(&record.product_id) {
            Some(&id) => id,
            None => {
                let attrs = ProductAttrs {
                    name: record.product_name.clone(),
                    unit_price: scalars.unit_price,
                    category_id,
                };
                let id = self
                    .repository
                    .resolve_or_create_product(&record.product_id, &attrs)
                    .await?;
                cache.products.insert(record.product_id.clone(), id);
                report.products_resolved += 1;
                metrics::record_dimension_resolved("product");
                id
            }
        };

        self.repository
            .create_order(NewOrder {
                external_id: record.order_id.clone(),
                customer_id,
                product_id,
                region_id,
                date_of_sale: scalars.date_of_sale,
                quantity_sold: scalars.quantity_sold,
                discount: scalars.discount,
                shipping_cost: scalars.shipping_cost,
                payment_method: record.payment_method.clone(),
            })
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salespulse_common::db::{models::*, sync_schema, DbPool};
    use sea_orm::{Database, EntityTrait};

    const HEADER: &str = "OrderID,ProductID,CustomerID,ProductName,Category,Region,DateOfSale,QuantitySold,UnitPrice,Discount,ShippingCost,PaymentMethod,CustomerName,CustomerEmail,CustomerAddress";

    fn batch(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    async fn pipeline() -> IngestionPipeline {
        let conn = Database::connect("sqlite::memory:").await.unwrap();
        sync_schema(&conn).await.unwrap();
        IngestionPipeline::new(Repository::new(DbPool::from_connection(conn)))
    }

    fn conn(pipeline: &IngestionPipeline) -> &sea_orm::DatabaseConnection {
        pipeline.repository.pool().read()
    }

    #[tokio::test]
    async fn test_ingest_normalizes_dimensions() {
        let pipeline = pipeline().await;
        let input = batch(&[
            "O-1,P-1,C-1,UltraBook 14,Electronics,North,2024-01-05,2,10.00,0.00,4.99,card,Ada,ada@example.com,1 Loop Road",
            "O-2,P-1,C-1,UltraBook 14,Electronics,North,2024-01-06,1,10.00,0.00,4.99,card,Ada,ada@example.com,1 Loop Road",
            "O-3,P-2,C-2,Field Notes,Stationery,South,2024-01-07,5,3.50,0.00,1.00,cash,Grace,grace@example.com,2 Branch Ave",
        ]);

        let report = pipeline
            .ingest(input.as_bytes(), IngestMode::Strict)
            .await
            .unwrap();

        assert_eq!(report.records_ingested, 3);
        assert_eq!(report.categories_resolved, 2);
        assert_eq!(report.regions_resolved, 2);
        assert_eq!(report.customers_resolved, 2);
        assert_eq!(report.products_resolved, 2);
        assert!(report.failures.is_empty());

        let db = conn(&pipeline);
        assert_eq!(CategoryEntity::find().all(db).await.unwrap().len(), 2);
        assert_eq!(RegionEntity::find().all(db).await.unwrap().len(), 2);
        assert_eq!(CustomerEntity::find().all(db).await.unwrap().len(), 2);
        assert_eq!(ProductEntity::find().all(db).await.unwrap().len(), 2);
        assert_eq!(OrderEntity::find().all(db).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_reingest_duplicates_orders_but_not_dimensions() {
        let pipeline = pipeline().await;
        let input = batch(&[
            "O-1,P-1,C-1,UltraBook 14,Electronics,North,2024-01-05,2,10.00,0.00,4.99,card,Ada,ada@example.com,1 Loop Road",
            "O-2,P-2,C-2,Field Notes,Stationery,South,2024-01-07,5,3.50,0.00,1.00,cash,Grace,grace@example.com,2 Branch Ave",
        ]);

        pipeline
            .ingest(input.as_bytes(), IngestMode::Strict)
            .await
            .unwrap();
        pipeline
            .ingest(input.as_bytes(), IngestMode::Strict)
            .await
            .unwrap();

        let db = conn(&pipeline);
        // Orders have no dedup key: 2 records x 2 runs.
        assert_eq!(OrderEntity::find().all(db).await.unwrap().len(), 4);
        assert_eq!(CustomerEntity::find().all(db).await.unwrap().len(), 2);
        assert_eq!(ProductEntity::find().all(db).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_second_occurrence_keeps_first_attributes() {
        let pipeline = pipeline().await;
        let input = batch(&[
            "O-1,P-1,C-1,UltraBook 14,Electronics,North,2024-01-05,2,10.00,0.00,4.99,card,Ada,ada@example.com,1 Loop Road",
            "O-2,P-1,C-1,UltraBook 14 Pro,Electronics,North,2024-01-06,1,12.00,0.00,4.99,card,Ada Lovelace,changed@example.com,9 New Street",
        ]);

        pipeline
            .ingest(input.as_bytes(), IngestMode::Strict)
            .await
            .unwrap();

        let db = conn(&pipeline);
        let customer = CustomerEntity::find().all(db).await.unwrap();
        assert_eq!(customer.len(), 1);
        assert_eq!(customer[0].email, "ada@example.com");
        assert_eq!(customer[0].address, "1 Loop Road");

        let product = ProductEntity::find().all(db).await.unwrap();
        assert_eq!(product.len(), 1);
        assert_eq!(product[0].name, "UltraBook 14");
        assert_eq!(product[0].unit_price, 10.00);
    }

    #[tokio::test]
    async fn test_strict_mode_aborts_on_malformed_quantity() {
        let pipeline = pipeline().await;
        let input = batch(&[
            "O-1,P-1,C-1,UltraBook 14,Electronics,North,2024-01-05,2,10.00,0.00,4.99,card,Ada,ada@example.com,1 Loop Road",
            "O-2,P-2,C-2,Field Notes,Stationery,South,2024-01-07,five,3.50,0.00,1.00,cash,Grace,grace@example.com,2 Branch Ave",
            "O-3,P-3,C-3,Desk Lamp,Home,East,2024-01-08,1,20.00,0.00,2.50,card,Alan,alan@example.com,3 Gate Walk",
        ]);

        let err = pipeline
            .ingest(input.as_bytes(), IngestMode::Strict)
            .await
            .unwrap_err();
        match err {
            AppError::FieldParse { field, record, .. } => {
                assert_eq!(field, "QuantitySold");
                assert_eq!(record, 2);
            }
            other => panic!("expected FieldParse, got {other:?}"),
        }

        // Rows committed before the failure remain; nothing after ran.
        let db = conn(&pipeline);
        assert_eq!(OrderEntity::find().all(db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_best_effort_mode_skips_and_reports() {
        let pipeline = pipeline().await;
        let input = batch(&[
            "O-1,P-1,C-1,UltraBook 14,Electronics,North,2024-01-05,2,10.00,0.00,4.99,card,Ada,ada@example.com,1 Loop Road",
            "O-2,P-2,C-2,Field Notes,Stationery,South,not-a-date,5,3.50,0.00,1.00,cash,Grace,grace@example.com,2 Branch Ave",
            "O-3,P-3,C-3,Desk Lamp,Home,East,2024-01-08,1,20.00,0.00,2.50,card,Alan,alan@example.com,3 Gate Walk",
        ]);

        let report = pipeline
            .ingest(input.as_bytes(), IngestMode::BestEffort)
            .await
            .unwrap();

        assert_eq!(report.records_ingested, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].record, 2);
        assert!(report.failures[0].message.contains("DateOfSale"));

        let db = conn(&pipeline);
        assert_eq!(OrderEntity::find().all(db).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_row_shape_is_a_validation_error() {
        let pipeline = pipeline().await;
        let input = batch(&["O-1,P-1,C-1,too,few,fields"]);

        let err = pipeline
            .ingest(input.as_bytes(), IngestMode::Strict)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
