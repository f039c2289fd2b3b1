//! Catalog Repository

use async_trait::async_trait;
use mockall::automock;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{Postgres, query, query_as, query_scalar, types::Json};
use storefront::products::{
    Category, CategoryDetails, CategoryUuid, Product, ProductDetails, ProductUuid,
};

use crate::{
    database::Db,
    domain::catalog::records::{CategoryRecord, ProductRecord},
};

const LIST_PRODUCTS_SQL: &str = include_str!("sql/list_products.sql");
const PRODUCTS_BY_CATEGORY_SQL: &str = include_str!("sql/products_by_category.sql");
const GET_PRODUCT_SQL: &str = include_str!("sql/get_product.sql");
const COUNT_PRODUCTS_IN_CATEGORY_SQL: &str = include_str!("sql/count_products_in_category.sql");
const LIST_CATEGORIES_SQL: &str = include_str!("sql/list_categories.sql");
const SUBCATEGORIES_SQL: &str = include_str!("sql/subcategories.sql");
const GET_CATEGORY_SQL: &str = include_str!("sql/get_category.sql");
const COUNT_SUBCATEGORIES_SQL: &str = include_str!("sql/count_subcategories.sql");
const DELETE_CATEGORY_SQL: &str = include_str!("sql/delete_category.sql");
const CREATE_PRODUCT_SQL: &str = include_str!("sql/create_product.sql");
const UPDATE_PRODUCT_SQL: &str = include_str!("sql/update_product.sql");
const DELETE_PRODUCT_SQL: &str = include_str!("sql/delete_product.sql");
const SET_PRODUCT_ORDER_SQL: &str = include_str!("sql/set_product_order.sql");
const CREATE_CATEGORY_SQL: &str = include_str!("sql/create_category.sql");
const UPDATE_CATEGORY_SQL: &str = include_str!("sql/update_category.sql");

/// Product and category documents.
#[automock]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Every product, unordered.
    async fn list_products(&self) -> Result<Vec<Product>, sqlx::Error>;

    /// Products whose category is `category`, unordered.
    async fn products_by_category(
        &self,
        category: CategoryUuid,
    ) -> Result<Vec<Product>, sqlx::Error>;

    /// One product, `None` when it doesn't exist.
    async fn get_product(&self, product: ProductUuid) -> Result<Option<Product>, sqlx::Error>;

    /// Number of products in `category`.
    async fn count_products_in_category(&self, category: CategoryUuid) -> Result<u64, sqlx::Error>;

    /// Every category, oldest first.
    async fn list_categories(&self) -> Result<Vec<Category>, sqlx::Error>;

    /// Direct children of `parent`, oldest first.
    async fn subcategories(&self, parent: CategoryUuid) -> Result<Vec<Category>, sqlx::Error>;

    /// One category, `None` when it doesn't exist.
    async fn get_category(&self, category: CategoryUuid) -> Result<Option<Category>, sqlx::Error>;

    /// Number of direct children of `parent`.
    async fn count_subcategories(&self, parent: CategoryUuid) -> Result<u64, sqlx::Error>;

    /// Hard-delete a category. Returns the number of rows removed.
    async fn delete_category(&self, category: CategoryUuid) -> Result<u64, sqlx::Error>;

    /// Insert a new product.
    async fn create_product(&self, product: &Product) -> Result<(), sqlx::Error>;

    /// Replace a product document. Returns the number of rows changed.
    async fn update_product(
        &self,
        product: ProductUuid,
        details: &ProductDetails,
    ) -> Result<u64, sqlx::Error>;

    /// Hard-delete a product. Returns the number of rows removed.
    async fn delete_product(&self, product: ProductUuid) -> Result<u64, sqlx::Error>;

    /// Give each product its index as manual sort position, in one transaction.
    ///
    /// Returns `false`, writing nothing, when any product doesn't exist.
    async fn reorder_products(&self, products: Vec<ProductUuid>) -> Result<bool, sqlx::Error>;

    /// Insert a new category.
    async fn create_category(&self, category: &Category) -> Result<(), sqlx::Error>;

    /// Replace a category document. Returns the number of rows changed.
    async fn update_category(
        &self,
        category: CategoryUuid,
        details: &CategoryDetails,
    ) -> Result<u64, sqlx::Error>;
}

#[derive(Debug, Clone)]
pub struct PgCatalogRepository {
    db: Db,
}

impl PgCatalogRepository {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    async fn count(&self, sql: &'static str, category: CategoryUuid) -> Result<u64, sqlx::Error> {
        let count: i64 = query_scalar(sql)
            .bind(category.to_string())
            .fetch_one(self.db.pool())
            .await?;

        u64::try_from(count).map_err(|e| sqlx::Error::ColumnDecode {
            index: "count".to_string(),
            source: Box::new(e),
        })
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn list_products(&self) -> Result<Vec<Product>, sqlx::Error> {
        let records = query_as::<Postgres, ProductRecord>(LIST_PRODUCTS_SQL)
            .fetch_all(self.db.pool())
            .await?;

        Ok(records.into_iter().map(|ProductRecord(product)| product).collect())
    }

    async fn products_by_category(
        &self,
        category: CategoryUuid,
    ) -> Result<Vec<Product>, sqlx::Error> {
        let records = query_as::<Postgres, ProductRecord>(PRODUCTS_BY_CATEGORY_SQL)
            .bind(category.to_string())
            .fetch_all(self.db.pool())
            .await?;

        Ok(records.into_iter().map(|ProductRecord(product)| product).collect())
    }

    async fn get_product(&self, product: ProductUuid) -> Result<Option<Product>, sqlx::Error> {
        let record = query_as::<Postgres, ProductRecord>(GET_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_optional(self.db.pool())
            .await?;

        Ok(record.map(|ProductRecord(product)| product))
    }

    async fn count_products_in_category(&self, category: CategoryUuid) -> Result<u64, sqlx::Error> {
        self.count(COUNT_PRODUCTS_IN_CATEGORY_SQL, category).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, sqlx::Error> {
        let records = query_as::<Postgres, CategoryRecord>(LIST_CATEGORIES_SQL)
            .fetch_all(self.db.pool())
            .await?;

        Ok(records.into_iter().map(|CategoryRecord(category)| category).collect())
    }

    async fn subcategories(&self, parent: CategoryUuid) -> Result<Vec<Category>, sqlx::Error> {
        let records = query_as::<Postgres, CategoryRecord>(SUBCATEGORIES_SQL)
            .bind(parent.to_string())
            .fetch_all(self.db.pool())
            .await?;

        Ok(records.into_iter().map(|CategoryRecord(category)| category).collect())
    }

    async fn get_category(&self, category: CategoryUuid) -> Result<Option<Category>, sqlx::Error> {
        let record = query_as::<Postgres, CategoryRecord>(GET_CATEGORY_SQL)
            .bind(category.into_uuid())
            .fetch_optional(self.db.pool())
            .await?;

        Ok(record.map(|CategoryRecord(category)| category))
    }

    async fn count_subcategories(&self, parent: CategoryUuid) -> Result<u64, sqlx::Error> {
        self.count(COUNT_SUBCATEGORIES_SQL, parent).await
    }

    async fn delete_category(&self, category: CategoryUuid) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_CATEGORY_SQL)
            .bind(category.into_uuid())
            .execute(self.db.pool())
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    async fn create_product(&self, product: &Product) -> Result<(), sqlx::Error> {
        query(CREATE_PRODUCT_SQL)
            .bind(product.uuid.into_uuid())
            .bind(Json(&product.details))
            .bind(SqlxTimestamp::from(product.created_at))
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    async fn update_product(
        &self,
        product: ProductUuid,
        details: &ProductDetails,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(UPDATE_PRODUCT_SQL)
            .bind(product.into_uuid())
            .bind(Json(details))
            .execute(self.db.pool())
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    async fn delete_product(&self, product: ProductUuid) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_PRODUCT_SQL)
            .bind(product.into_uuid())
            .execute(self.db.pool())
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    async fn reorder_products(&self, products: Vec<ProductUuid>) -> Result<bool, sqlx::Error> {
        let mut tx = self.db.pool().begin().await?;

        for (position, product) in (0_i64..).zip(products) {
            let rows_affected = query(SET_PRODUCT_ORDER_SQL)
                .bind(product.into_uuid())
                .bind(position)
                .execute(&mut *tx)
                .await?
                .rows_affected();

            if rows_affected == 0 {
                tx.rollback().await?;

                return Ok(false);
            }
        }

        tx.commit().await?;

        Ok(true)
    }

    async fn create_category(&self, category: &Category) -> Result<(), sqlx::Error> {
        query(CREATE_CATEGORY_SQL)
            .bind(category.uuid.into_uuid())
            .bind(Json(&category.details))
            .bind(SqlxTimestamp::from(category.created_at))
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    async fn update_category(
        &self,
        category: CategoryUuid,
        details: &CategoryDetails,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(UPDATE_CATEGORY_SQL)
            .bind(category.into_uuid())
            .bind(Json(details))
            .execute(self.db.pool())
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}
