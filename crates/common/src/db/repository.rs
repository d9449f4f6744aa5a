//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations. Dimension
//! resolution is a single conflict-handling insert per business key:
//! the existing row wins and its attributes are never rewritten.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set, Statement, Value,
};
use uuid::Uuid;

/// Creation-time attributes for a customer. Ignored when the business
/// key already exists.
#[derive(Debug, Clone)]
pub struct CustomerAttrs {
    pub name: String,
    pub email: String,
    pub address: String,
}

/// Creation-time attributes for a product. Ignored when the business
/// key already exists.
#[derive(Debug, Clone)]
pub struct ProductAttrs {
    pub name: String,
    pub unit_price: f64,
    pub category_id: Uuid,
}

/// A fully-resolved order fact row ready for insertion
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub external_id: String,
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub region_id: Uuid,
    pub date_of_sale: NaiveDate,
    pub quantity_sold: i32,
    pub discount: f64,
    pub shipping_cost: f64,
    pub payment_method: String,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    /// The pool backing this repository
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Dimension Resolution
    // ========================================================================
    //
    // Each resolver issues one statement:
    //
    //   INSERT ... ON CONFLICT (<business key>)
    //   DO UPDATE SET <business key> = excluded.<business key>
    //   RETURNING id
    //
    // On conflict the no-op update leaves every descriptive attribute
    // untouched and RETURNING yields the existing surrogate key, so
    // lookup-or-create is atomic under concurrent ingestion.

    /// Resolve a category by name, creating it if absent
    pub async fn resolve_or_create_category(&self, name: &str) -> Result<Uuid> {
        self.resolve_dimension(
            "category",
            name,
            r#"
            INSERT INTO categories (id, name, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE SET name = excluded.name
            RETURNING id
            "#,
            vec![Uuid::new_v4().into(), name.into(), Utc::now().into()],
        )
        .await
    }

    /// Resolve a region by name, creating it if absent
    pub async fn resolve_or_create_region(&self, name: &str) -> Result<Uuid> {
        self.resolve_dimension(
            "region",
            name,
            r#"
            INSERT INTO regions (id, name, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE SET name = excluded.name
            RETURNING id
            "#,
            vec![Uuid::new_v4().into(), name.into(), Utc::now().into()],
        )
        .await
    }

    /// Resolve a customer by external id, creating it with the given
    /// attributes if absent. Attributes of an existing customer are
    /// left as stored.
    pub async fn resolve_or_create_customer(
        &self,
        external_id: &str,
        attrs: &CustomerAttrs,
    ) -> Result<Uuid> {
        self.resolve_dimension(
            "customer",
            external_id,
            r#"
            INSERT INTO customers (id, external_id, name, email, address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (external_id) DO UPDATE SET external_id = excluded.external_id
            RETURNING id
            "#,
            vec![
                Uuid::new_v4().into(),
                external_id.into(),
                attrs.name.as_str().into(),
                attrs.email.as_str().into(),
                attrs.address.as_str().into(),
                Utc::now().into(),
            ],
        )
        .await
    }

    /// Resolve a product by external id, creating it with the given
    /// attributes if absent. Attributes of an existing product are left
    /// as stored.
    pub async fn resolve_or_create_product(
        &self,
        external_id: &str,
        attrs: &ProductAttrs,
    ) -> Result<Uuid> {
        self.resolve_dimension(
            "product",
            external_id,
            r#"
            INSERT INTO products (id, external_id, name, unit_price, category_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (external_id) DO UPDATE SET external_id = excluded.external_id
            RETURNING id
            "#,
            vec![
                Uuid::new_v4().into(),
                external_id.into(),
                attrs.name.as_str().into(),
                attrs.unit_price.into(),
                attrs.category_id.into(),
                Utc::now().into(),
            ],
        )
        .await
    }

    async fn resolve_dimension(
        &self,
        kind: &str,
        key: &str,
        sql: &str,
        values: Vec<Value>,
    ) -> Result<Uuid> {
        let backend = self.write_conn().get_database_backend();
        let stmt = Statement::from_sql_and_values(backend, sql, values);

        let row = self
            .write_conn()
            .query_one(stmt)
            .await
            .map_err(|e| AppError::ReferentialResolution {
                kind: kind.to_string(),
                key: key.to_string(),
                message: e.to_string(),
            })?
            .ok_or_else(|| AppError::ReferentialResolution {
                kind: kind.to_string(),
                key: key.to_string(),
                message: "insert returned no row".to_string(),
            })?;

        row.try_get_by_index::<Uuid>(0)
            .map_err(|e| AppError::ReferentialResolution {
                kind: kind.to_string(),
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    // ========================================================================
    // Fact Rows
    // ========================================================================

    /// Append one order fact row. Orders are never deduplicated: the
    /// same external id can appear any number of times.
    pub async fn create_order(&self, order: NewOrder) -> Result<Uuid> {
        let order_id = Uuid::new_v4();
        let now = Utc::now();

        let row = OrderActiveModel {
            id: Set(order_id),
            external_id: Set(order.external_id),
            customer_id: Set(order.customer_id),
            product_id: Set(order.product_id),
            region_id: Set(order.region_id),
            date_of_sale: Set(order.date_of_sale),
            quantity_sold: Set(order.quantity_sold),
            discount: Set(order.discount),
            shipping_cost: Set(order.shipping_cost),
            payment_method: Set(order.payment_method),
            created_at: Set(now.into()),
        };

        row.insert(self.write_conn()).await?;
        Ok(order_id)
    }

    /// Count all order rows
    pub async fn count_orders(&self) -> Result<u64> {
        OrderEntity::find()
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Find category by name
    pub async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        CategoryEntity::find()
            .filter(CategoryColumn::Name.eq(name))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find region by name
    pub async fn find_region_by_name(&self, name: &str) -> Result<Option<Region>> {
        RegionEntity::find()
            .filter(RegionColumn::Name.eq(name))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find customer by external id
    pub async fn find_customer_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Customer>> {
        CustomerEntity::find()
            .filter(CustomerColumn::ExternalId.eq(external_id))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find product by external id
    pub async fn find_product_by_external_id(&self, external_id: &str) -> Result<Option<Product>> {
        ProductEntity::find()
            .filter(ProductColumn::ExternalId.eq(external_id))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{sync_schema, DbPool};
    use sea_orm::Database;

    async fn repository() -> Repository {
        let conn = Database::connect("sqlite::memory:").await.unwrap();
        sync_schema(&conn).await.unwrap();
        Repository::new(DbPool::from_connection(conn))
    }

    fn customer_attrs(name: &str, email: &str) -> CustomerAttrs {
        CustomerAttrs {
            name: name.to_string(),
            email: email.to_string(),
            address: "1 Loop Road".to_string(),
        }
    }

    #[tokio::test]
    async fn resolving_same_category_twice_returns_same_row() {
        let repo = repository().await;

        let first = repo.resolve_or_create_category("Electronics").await.unwrap();
        let second = repo.resolve_or_create_category("Electronics").await.unwrap();
        assert_eq!(first, second);

        let rows = CategoryEntity::find().all(repo.read_conn()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Electronics");
    }

    #[tokio::test]
    async fn distinct_regions_get_distinct_rows() {
        let repo = repository().await;

        let north = repo.resolve_or_create_region("North").await.unwrap();
        let south = repo.resolve_or_create_region("South").await.unwrap();
        assert_ne!(north, south);

        let rows = RegionEntity::find().all(repo.read_conn()).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn customer_attributes_are_not_overwritten() {
        let repo = repository().await;

        let first = repo
            .resolve_or_create_customer("C-1", &customer_attrs("Ada", "ada@example.com"))
            .await
            .unwrap();
        // Same business key with changed attributes: the stored row wins.
        let second = repo
            .resolve_or_create_customer("C-1", &customer_attrs("Ada L.", "new@example.com"))
            .await
            .unwrap();
        assert_eq!(first, second);

        let stored = repo
            .find_customer_by_external_id("C-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.name, "Ada");
        assert_eq!(stored.email, "ada@example.com");

        let rows = CustomerEntity::find().all(repo.read_conn()).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn product_price_is_fixed_at_first_encounter() {
        let repo = repository().await;
        let category = repo.resolve_or_create_category("Books").await.unwrap();

        let attrs = ProductAttrs {
            name: "Novel".to_string(),
            unit_price: 12.50,
            category_id: category,
        };
        let first = repo.resolve_or_create_product("P-9", &attrs).await.unwrap();

        let repriced = ProductAttrs {
            unit_price: 99.99,
            ..attrs
        };
        let second = repo
            .resolve_or_create_product("P-9", &repriced)
            .await
            .unwrap();
        assert_eq!(first, second);

        let stored = repo
            .find_product_by_external_id("P-9")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.unit_price, 12.50);
    }

    #[tokio::test]
    async fn orders_are_never_deduplicated() {
        let repo = repository().await;
        let category = repo.resolve_or_create_category("Books").await.unwrap();
        let region = repo.resolve_or_create_region("North").await.unwrap();
        let customer = repo
            .resolve_or_create_customer("C-1", &customer_attrs("Ada", "ada@example.com"))
            .await
            .unwrap();
        let product = repo
            .resolve_or_create_product(
                "P-1",
                &ProductAttrs {
                    name: "Novel".to_string(),
                    unit_price: 10.0,
                    category_id: category,
                },
            )
            .await
            .unwrap();

        let order = NewOrder {
            external_id: "O-1".to_string(),
            customer_id: customer,
            product_id: product,
            region_id: region,
            date_of_sale: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            quantity_sold: 2,
            discount: 0.0,
            shipping_cost: 4.99,
            payment_method: "card".to_string(),
        };

        repo.create_order(order.clone()).await.unwrap();
        repo.create_order(order).await.unwrap();

        assert_eq!(repo.count_orders().await.unwrap(), 2);
    }
}
