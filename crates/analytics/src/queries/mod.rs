//! Aggregate query engine
//!
//! One entry point per query family. Every query takes a validated
//! [`DateRange`] and runs against the pool's read connection.

mod customers;
mod revenue;
mod top_products;

pub use customers::CustomerAnalysis;
pub use revenue::{Revenue, RevenueGroup, RevenueGroupBy};
pub use top_products::{TopProduct, TopProductsQuery};

use crate::range::DateRange;
use salespulse_common::db::DbPool;
use salespulse_common::errors::Result;
use salespulse_common::metrics::QueryTimer;
use tracing::instrument;

/// Read-side aggregation engine
#[derive(Clone)]
pub struct AnalyticsEngine {
    pool: DbPool,
}

impl AnalyticsEngine {
    /// Create a new engine on the given pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Revenue over the range: a single total, or one row per group
    #[instrument(skip(self))]
    pub async fn revenue(
        &self,
        range: &DateRange,
        group_by: Option<RevenueGroupBy>,
    ) -> Result<Revenue> {
        let timer = QueryTimer::start("revenue");
        let result = revenue::compute(self.pool.read(), range, group_by).await;
        timer.finish();
        result
    }

    /// Products ranked by quantity sold over the range
    #[instrument(skip(self, query))]
    pub async fn top_products(
        &self,
        range: &DateRange,
        query: &TopProductsQuery,
    ) -> Result<Vec<TopProduct>> {
        let timer = QueryTimer::start("top_products");
        let result = top_products::compute(self.pool.read(), range, query).await;
        timer.finish();
        result
    }

    /// Customer statistics over the range
    #[instrument(skip(self))]
    pub async fn customer_analysis(&self, range: &DateRange) -> Result<CustomerAnalysis> {
        let timer = QueryTimer::start("customer_analysis");
        let result = customers::compute(self.pool.read(), range).await;
        timer.finish();
        result
    }
}
