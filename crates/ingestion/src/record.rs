//! Raw record model and field coercion
//!
//! A `RawSaleRecord` is one row of the sales export file, bound by
//! header name. All fields arrive as strings; the numeric and date
//! fields are coerced explicitly so a bad value fails the record with
//! the offending field and raw value instead of a sentinel.

use chrono::NaiveDate;
use salespulse_common::errors::{AppError, Result};
use serde::Deserialize;

/// Date format used by the export files
const DATE_FORMAT: &str = "%Y-%m-%d";

/// One row of the sales export file, as read from the source
#[derive(Debug, Clone, Deserialize)]
pub struct RawSaleRecord {
    #[serde(rename = "OrderID")]
    pub order_id: String,

    #[serde(rename = "ProductID")]
    pub product_id: String,

    #[serde(rename = "CustomerID")]
    pub customer_id: String,

    #[serde(rename = "ProductName")]
    pub product_name: String,

    #[serde(rename = "Category")]
    pub category: String,

    #[serde(rename = "Region")]
    pub region: String,

    #[serde(rename = "DateOfSale")]
    pub date_of_sale: String,

    #[serde(rename = "QuantitySold")]
    pub quantity_sold: String,

    #[serde(rename = "UnitPrice")]
    pub unit_price: String,

    #[serde(rename = "Discount")]
    pub discount: String,

    #[serde(rename = "ShippingCost")]
    pub shipping_cost: String,

    #[serde(rename = "PaymentMethod")]
    pub payment_method: String,

    #[serde(rename = "CustomerName")]
    pub customer_name: String,

    #[serde(rename = "CustomerEmail")]
    pub customer_email: String,

    #[serde(rename = "CustomerAddress")]
    pub customer_address: String,
}

/// Scalar fields of a record after coercion
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedScalars {
    pub date_of_sale: NaiveDate,
    pub quantity_sold: i32,
    pub unit_price: f64,
    pub discount: f64,
    pub shipping_cost: f64,
}

impl RawSaleRecord {
    /// Coerce the numeric and date fields of this record.
    ///
    /// `record` is the 1-based position of the row within the batch,
    /// carried into any parse error.
    pub fn parse_scalars(&self, record: usize) -> Result<ParsedScalars> {
        Ok(ParsedScalars {
            date_of_sale: parse_date("DateOfSale", &self.date_of_sale, record)?,
            quantity_sold: parse_quantity("QuantitySold", &self.quantity_sold, record)?,
            unit_price: parse_decimal("UnitPrice", &self.unit_price, record)?,
            discount: parse_decimal("Discount", &self.discount, record)?,
            shipping_cost: parse_decimal("ShippingCost", &self.shipping_cost, record)?,
        })
    }
}

fn field_error(field: &str, value: &str, record: usize) -> AppError {
    AppError::FieldParse {
        field: field.to_string(),
        value: value.to_string(),
        record,
    }
}

fn parse_date(field: &str, value: &str, record: usize) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| field_error(field, value, record))
}

fn parse_quantity(field: &str, value: &str, record: usize) -> Result<i32> {
    let quantity: i32 = value
        .trim()
        .parse()
        .map_err(|_| field_error(field, value, record))?;

    // Quantities are counts of units sold; negative input is malformed.
    if quantity < 0 {
        return Err(field_error(field, value, record));
    }
    Ok(quantity)
}

fn parse_decimal(field: &str, value: &str, record: usize) -> Result<f64> {
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| field_error(field, value, record))?;

    if !parsed.is_finite() {
        return Err(field_error(field, value, record));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, quantity: &str, price: &str) -> RawSaleRecord {
        RawSaleRecord {
            order_id: "O-1".into(),
            product_id: "P-1".into(),
            customer_id: "C-1".into(),
            product_name: "UltraBook 14".into(),
            category: "Electronics".into(),
            region: "North".into(),
            date_of_sale: date.into(),
            quantity_sold: quantity.into(),
            unit_price: price.into(),
            discount: "0.10".into(),
            shipping_cost: "4.99".into(),
            payment_method: "card".into(),
            customer_name: "Ada Lovelace".into(),
            customer_email: "ada@example.com".into(),
            customer_address: "1 Loop Road".into(),
        }
    }

    #[test]
    fn test_parse_valid_scalars() {
        let parsed = record("2024-01-05", "2", "10.00").parse_scalars(1).unwrap();
        assert_eq!(
            parsed.date_of_sale,
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert_eq!(parsed.quantity_sold, 2);
        assert_eq!(parsed.unit_price, 10.00);
        assert_eq!(parsed.discount, 0.10);
        assert_eq!(parsed.shipping_cost, 4.99);
    }

    #[test]
    fn test_non_numeric_quantity_identifies_field() {
        let err = record("2024-01-05", "two", "10.00")
            .parse_scalars(7)
            .unwrap_err();
        match err {
            AppError::FieldParse {
                field,
                value,
                record,
            } => {
                assert_eq!(field, "QuantitySold");
                assert_eq!(value, "two");
                assert_eq!(record, 7);
            }
            other => panic!("expected FieldParse, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let err = record("2024-01-05", "-3", "10.00")
            .parse_scalars(1)
            .unwrap_err();
        assert!(matches!(err, AppError::FieldParse { .. }));
    }

    #[test]
    fn test_unparsable_date_rejected() {
        let err = record("05/01/2024", "2", "10.00")
            .parse_scalars(1)
            .unwrap_err();
        match err {
            AppError::FieldParse { field, .. } => assert_eq!(field, "DateOfSale"),
            other => panic!("expected FieldParse, got {other:?}"),
        }
    }

    #[test]
    fn test_whitespace_is_tolerated() {
        let parsed = record(" 2024-01-05 ", " 2 ", " 10.00 ")
            .parse_scalars(1)
            .unwrap();
        assert_eq!(parsed.quantity_sold, 2);
    }
}
