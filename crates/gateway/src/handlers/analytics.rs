//! Analytics handlers
//!
//! Thin wrappers over the aggregation engine. Parameter names and
//! response shapes follow the public query surface: camelCase query
//! strings, dates as `YYYY-MM-DD`.

use crate::AppState;
use axum::extract::{Query, State};
use axum::Json;
use salespulse_analytics::{
    AnalyticsEngine, CustomerAnalysis, DateRange, Revenue, RevenueGroup, RevenueGroupBy,
    TopProduct, TopProductsQuery,
};
use salespulse_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use validator::Validate;

fn engine(state: &AppState) -> AnalyticsEngine {
    AnalyticsEngine::new(state.db.clone())
}

fn validation_error(e: validator::ValidationErrors) -> AppError {
    AppError::Validation {
        message: e.to_string(),
        field: None,
    }
}

// ============================================================================
// Revenue
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueParams {
    pub start_date: String,
    pub end_date: String,
    pub group_by: Option<RevenueGroupBy>,
}

/// Revenue response: a scalar total, or one row per group
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RevenueResponse {
    Total {
        #[serde(rename = "totalRevenue")]
        total_revenue: f64,
    },
    Grouped(Vec<RevenueGroup>),
}

/// Revenue over a date range, optionally grouped by one dimension
pub async fn revenue(
    State(state): State<AppState>,
    Query(params): Query<RevenueParams>,
) -> Result<Json<RevenueResponse>> {
    let range = DateRange::parse(&params.start_date, &params.end_date)?;

    let response = match engine(&state).revenue(&range, params.group_by).await? {
        Revenue::Total(total_revenue) => RevenueResponse::Total { total_revenue },
        Revenue::Grouped(groups) => RevenueResponse::Grouped(groups),
    };

    Ok(Json(response))
}

// ============================================================================
// Top products
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TopProductsParams {
    pub start_date: String,
    pub end_date: String,

    /// Number of products to return (default: 10)
    #[validate(range(min = 1))]
    pub limit: Option<i64>,

    /// Exact-match category filter
    pub category: Option<String>,

    /// Exact-match region filter
    pub region: Option<String>,
}

/// Top products by quantity sold over a date range
pub async fn top_products(
    State(state): State<AppState>,
    Query(params): Query<TopProductsParams>,
) -> Result<Json<Vec<TopProduct>>> {
    params.validate().map_err(validation_error)?;

    let range = DateRange::parse(&params.start_date, &params.end_date)?;
    let query = TopProductsQuery {
        limit: params.limit,
        category: params.category,
        region: params.region,
    };

    let products = engine(&state).top_products(&range, &query).await?;
    Ok(Json(products))
}

// ============================================================================
// Customer analysis
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAnalysisParams {
    pub start_date: String,
    pub end_date: String,
}

/// Customer statistics over a date range
pub async fn customer_analysis(
    State(state): State<AppState>,
    Query(params): Query<CustomerAnalysisParams>,
) -> Result<Json<CustomerAnalysis>> {
    let range = DateRange::parse(&params.start_date, &params.end_date)?;

    let analysis = engine(&state).customer_analysis(&range).await?;
    Ok(Json(analysis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revenue_params_accept_camel_case() {
        let params: RevenueParams = serde_json::from_value(serde_json::json!({
            "startDate": "2024-01-01",
            "endDate": "2024-02-28",
            "groupBy": "category",
        }))
        .unwrap();
        assert_eq!(params.start_date, "2024-01-01");
        assert_eq!(params.group_by, Some(RevenueGroupBy::Category));
    }

    #[test]
    fn test_top_products_limit_validation() {
        let params = TopProductsParams {
            start_date: "2024-01-01".into(),
            end_date: "2024-02-28".into(),
            limit: Some(0),
            category: None,
            region: None,
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_revenue_response_shapes() {
        let total = serde_json::to_value(RevenueResponse::Total {
            total_revenue: 25.0,
        })
        .unwrap();
        assert_eq!(total, serde_json::json!({"totalRevenue": 25.0}));

        let grouped = serde_json::to_value(RevenueResponse::Grouped(vec![RevenueGroup {
            name: "Electronics".into(),
            revenue: 20.0,
        }]))
        .unwrap();
        assert_eq!(
            grouped,
            serde_json::json!([{"name": "Electronics", "revenue": 20.0}])
        );
    }
}
