//! Revenue query
//!
//! `Σ(quantity_sold × unit_price)` over orders in range, either as a
//! single total or grouped by one dimension's name. Groups with no
//! matching orders are omitted; grouped results are ordered ascending
//! by name so the output is reproducible.

use crate::range::DateRange;
use salespulse_common::errors::Result;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Statement};
use serde::{Deserialize, Serialize};

/// Dimension to group revenue by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevenueGroupBy {
    Product,
    Category,
    Region,
}

/// One grouped revenue row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueGroup {
    pub name: String,
    pub revenue: f64,
}

/// Revenue result: a scalar total, or one row per group
#[derive(Debug, Clone, PartialEq)]
pub enum Revenue {
    Total(f64),
    Grouped(Vec<RevenueGroup>),
}

pub(super) async fn compute(
    conn: &DatabaseConnection,
    range: &DateRange,
    group_by: Option<RevenueGroupBy>,
) -> Result<Revenue> {
    match group_by {
        None => total(conn, range).await,
        Some(group_by) => grouped(conn, range, group_by).await,
    }
}

async fn total(conn: &DatabaseConnection, range: &DateRange) -> Result<Revenue> {
    let stmt = Statement::from_sql_and_values(
        conn.get_database_backend(),
        r#"
        SELECT COALESCE(SUM(o.quantity_sold * p.unit_price), 0.0) AS total_revenue
        FROM orders o
        JOIN products p ON o.product_id = p.id
        WHERE o.date_of_sale BETWEEN $1 AND $2
        "#,
        vec![range.start().into(), range.end().into()],
    );

    let revenue = match conn.query_one(stmt).await? {
        Some(row) => row.try_get_by_index::<f64>(0).map_err(DbErr::from)?,
        None => 0.0,
    };

    Ok(Revenue::Total(revenue))
}

async fn grouped(
    conn: &DatabaseConnection,
    range: &DateRange,
    group_by: RevenueGroupBy,
) -> Result<Revenue> {
    // Each grouping joins exactly the tables it needs; the grouped
    // column is always the dimension's name.
    let sql = match group_by {
        RevenueGroupBy::Product => {
            r#"
            SELECT p.name AS name, SUM(o.quantity_sold * p.unit_price) AS revenue
            FROM orders o
            JOIN products p ON o.product_id = p.id
            WHERE o.date_of_sale BETWEEN $1 AND $2
            GROUP BY p.name
            ORDER BY p.name ASC
            "#
        }
        RevenueGroupBy::Category => {
            r#"
            SELECT c.name AS name, SUM(o.quantity_sold * p.unit_price) AS revenue
            FROM orders o
            JOIN products p ON o.product_id = p.id
            JOIN categories c ON p.category_id = c.id
            WHERE o.date_of_sale BETWEEN $1 AND $2
            GROUP BY c.name
            ORDER BY c.name ASC
            "#
        }
        RevenueGroupBy::Region => {
            r#"
            SELECT r.name AS name, SUM(o.quantity_sold * p.unit_price) AS revenue
            FROM orders o
            JOIN products p ON o.product_id = p.id
            JOIN regions r ON o.region_id = r.id
            WHERE o.date_of_sale BETWEEN $1 AND $2
            GROUP BY r.name
            ORDER BY r.name ASC
            "#
        }
    };

    let stmt = Statement::from_sql_and_values(
        conn.get_database_backend(),
        sql,
        vec![range.start().into(), range.end().into()],
    );

    let groups = conn
        .query_all(stmt)
        .await?
        .into_iter()
        .map(|row| {
            Ok(RevenueGroup {
                name: row.try_get_by_index::<String>(0).map_err(DbErr::from)?,
                revenue: row.try_get_by_index::<f64>(1).map_err(DbErr::from)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Revenue::Grouped(groups))
}
