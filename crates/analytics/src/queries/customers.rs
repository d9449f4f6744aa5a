//! Customer analysis query
//!
//! Distinct customers with at least one order in range, order count,
//! and average order value. The three reads share one read-only
//! transaction so they observe a consistent snapshot under concurrent
//! ingestion.

use crate::range::DateRange;
use salespulse_common::errors::Result;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Statement, TransactionTrait};
use serde::Serialize;

/// Customer statistics over a date range
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAnalysis {
    pub total_customers: i64,
    pub total_orders: i64,
    pub avg_order_value: f64,
}

pub(super) async fn compute(
    conn: &DatabaseConnection,
    range: &DateRange,
) -> Result<CustomerAnalysis> {
    let txn = conn.begin().await?;
    let backend = txn.get_database_backend();
    let params = || vec![range.start().into(), range.end().into()];

    let total_customers = {
        let stmt = Statement::from_sql_and_values(
            backend,
            r#"
            SELECT COUNT(DISTINCT customer_id)
            FROM orders
            WHERE date_of_sale BETWEEN $1 AND $2
            "#,
            params(),
        );
        match txn.query_one(stmt).await? {
            Some(row) => row.try_get_by_index::<i64>(0).map_err(DbErr::from)?,
            None => 0,
        }
    };

    let total_orders = {
        let stmt = Statement::from_sql_and_values(
            backend,
            r#"
            SELECT COUNT(id)
            FROM orders
            WHERE date_of_sale BETWEEN $1 AND $2
            "#,
            params(),
        );
        match txn.query_one(stmt).await? {
            Some(row) => row.try_get_by_index::<i64>(0).map_err(DbErr::from)?,
            None => 0,
        }
    };

    let avg_order_value = {
        let stmt = Statement::from_sql_and_values(
            backend,
            r#"
            SELECT COALESCE(AVG(o.quantity_sold * p.unit_price), 0.0) AS avg_order_value
            FROM orders o
            JOIN products p ON o.product_id = p.id
            WHERE o.date_of_sale BETWEEN $1 AND $2
            "#,
            params(),
        );
        match txn.query_one(stmt).await? {
            Some(row) => row.try_get_by_index::<f64>(0).map_err(DbErr::from)?,
            None => 0.0,
        }
    };

    txn.commit().await?;

    Ok(CustomerAnalysis {
        total_customers,
        total_orders,
        avg_order_value,
    })
}
