//! Top products query
//!
//! Products ranked by total quantity sold within the range, with
//! optional exact-match category and region filters. Ordered by total
//! quantity descending, ties broken ascending by product name.

use crate::range::DateRange;
use salespulse_common::errors::{AppError, Result};
use salespulse_common::DEFAULT_TOP_PRODUCTS_LIMIT;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Statement, Value};
use serde::Serialize;

/// One ranked product row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub name: String,
    pub total_quantity: i64,
}

/// Filters for the top-products query
#[derive(Debug, Clone, Default)]
pub struct TopProductsQuery {
    /// Maximum rows to return; defaults to 10, must be at least 1
    pub limit: Option<i64>,

    /// Exact-match category name filter
    pub category: Option<String>,

    /// Exact-match region name filter
    pub region: Option<String>,
}

pub(super) async fn compute(
    conn: &DatabaseConnection,
    range: &DateRange,
    query: &TopProductsQuery,
) -> Result<Vec<TopProduct>> {
    let limit = query.limit.unwrap_or(DEFAULT_TOP_PRODUCTS_LIMIT as i64);
    if limit < 1 {
        return Err(AppError::InvalidLimit { limit });
    }

    let mut values: Vec<Value> = vec![range.start().into(), range.end().into()];
    let mut filters = String::new();

    if let Some(ref category) = query.category {
        values.push(category.as_str().into());
        filters.push_str(&format!(" AND c.name = ${}", values.len()));
    }

    if let Some(ref region) = query.region {
        values.push(region.as_str().into());
        filters.push_str(&format!(" AND r.name = ${}", values.len()));
    }

    values.push(limit.into());

    let sql = format!(
        r#"
        SELECT p.name AS name, SUM(o.quantity_sold) AS total_quantity
        FROM orders o
        JOIN products p ON o.product_id = p.id
        JOIN categories c ON p.category_id = c.id
        JOIN regions r ON o.region_id = r.id
        WHERE o.date_of_sale BETWEEN $1 AND $2{}
        GROUP BY p.name
        ORDER BY total_quantity DESC, p.name ASC
        LIMIT ${}
        "#,
        filters,
        values.len()
    );

    let stmt = Statement::from_sql_and_values(conn.get_database_backend(), sql, values);

    conn.query_all(stmt)
        .await?
        .into_iter()
        .map(|row| {
            Ok(TopProduct {
                name: row.try_get_by_index::<String>(0).map_err(DbErr::from)?,
                total_quantity: row.try_get_by_index::<i64>(1).map_err(DbErr::from)?,
            })
        })
        .collect()
}
