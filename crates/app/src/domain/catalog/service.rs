//! Catalog Service

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use storefront::products::{
    Category, CategoryDetails, CategoryUuid, Product, ProductDetails, ProductUuid, sort_products,
};
use tracing::{Span, info};

use crate::{
    database::{Db, bounded},
    domain::catalog::{
        errors::CatalogServiceError,
        repository::{CatalogRepository, PgCatalogRepository},
    },
};

#[derive(Clone)]
pub struct StoreCatalogService<R> {
    repository: Arc<R>,
    timeout: Duration,
}

/// Catalog service backed by `PostgreSQL`.
pub type PgCatalogService = StoreCatalogService<PgCatalogRepository>;

impl PgCatalogService {
    #[must_use]
    pub fn new(db: Db, timeout: Duration) -> Self {
        Self::with_repository(PgCatalogRepository::new(db), timeout)
    }
}

impl<R: CatalogRepository> StoreCatalogService<R> {
    #[must_use]
    pub fn with_repository(repository: R, timeout: Duration) -> Self {
        Self {
            repository: Arc::new(repository),
            timeout,
        }
    }

    async fn ensure_parent_exists(
        &self,
        parent: Option<CategoryUuid>,
    ) -> Result<(), CatalogServiceError> {
        let Some(parent) = parent else {
            return Ok(());
        };

        bounded::<_, CatalogServiceError, _>(self.timeout, self.repository.get_category(parent))
            .await?
            .map(|_| ())
            .ok_or(CatalogServiceError::ParentNotFound)
    }
}

impl<R> std::fmt::Debug for StoreCatalogService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCatalogService")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<R: CatalogRepository + 'static> CatalogService for StoreCatalogService<R> {
    #[tracing::instrument(
        name = "catalog.service.list_products",
        skip(self),
        fields(product_count = tracing::field::Empty),
        err
    )]
    async fn list_products(&self) -> Result<Vec<Product>, CatalogServiceError> {
        let mut products = bounded::<_, CatalogServiceError, _>(
            self.timeout,
            self.repository.list_products(),
        )
        .await?;

        sort_products(&mut products);

        Span::current().record("product_count", products.len());

        Ok(products)
    }

    #[tracing::instrument(
        name = "catalog.service.products_by_category",
        skip(self),
        fields(category_uuid = %category),
        err
    )]
    async fn products_by_category(
        &self,
        category: CategoryUuid,
    ) -> Result<Vec<Product>, CatalogServiceError> {
        let mut products = bounded::<_, CatalogServiceError, _>(
            self.timeout,
            self.repository.products_by_category(category),
        )
        .await?;

        sort_products(&mut products);

        Ok(products)
    }

    #[tracing::instrument(
        name = "catalog.service.get_product",
        skip(self),
        fields(product_uuid = %product),
        err
    )]
    async fn get_product(&self, product: ProductUuid) -> Result<Product, CatalogServiceError> {
        bounded::<_, CatalogServiceError, _>(self.timeout, self.repository.get_product(product))
            .await?
            .ok_or(CatalogServiceError::ProductNotFound)
    }

    #[tracing::instrument(name = "catalog.service.list_categories", skip(self), err)]
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogServiceError> {
        bounded(self.timeout, self.repository.list_categories()).await
    }

    #[tracing::instrument(
        name = "catalog.service.subcategories",
        skip(self),
        fields(parent_uuid = %parent),
        err
    )]
    async fn subcategories(
        &self,
        parent: CategoryUuid,
    ) -> Result<Vec<Category>, CatalogServiceError> {
        bounded(self.timeout, self.repository.subcategories(parent)).await
    }

    #[tracing::instrument(
        name = "catalog.service.get_category",
        skip(self),
        fields(category_uuid = %category),
        err
    )]
    async fn get_category(&self, category: CategoryUuid) -> Result<Category, CatalogServiceError> {
        bounded::<_, CatalogServiceError, _>(self.timeout, self.repository.get_category(category))
            .await?
            .ok_or(CatalogServiceError::CategoryNotFound)
    }

    #[tracing::instrument(
        name = "catalog.service.delete_category",
        skip(self),
        fields(category_uuid = %category),
        err
    )]
    async fn delete_category(&self, category: CategoryUuid) -> Result<(), CatalogServiceError> {
        let products = bounded::<_, CatalogServiceError, _>(
            self.timeout,
            self.repository.count_products_in_category(category),
        )
        .await?;

        let subcategories = bounded::<_, CatalogServiceError, _>(
            self.timeout,
            self.repository.count_subcategories(category),
        )
        .await?;

        if products > 0 || subcategories > 0 {
            return Err(CatalogServiceError::CategoryInUse {
                products,
                subcategories,
            });
        }

        let rows_affected = bounded::<_, CatalogServiceError, _>(
            self.timeout,
            self.repository.delete_category(category),
        )
        .await?;

        if rows_affected == 0 {
            return Err(CatalogServiceError::CategoryNotFound);
        }

        info!("deleted category");

        Ok(())
    }

    #[tracing::instrument(
        name = "catalog.service.create_product",
        skip(self, details),
        fields(
            product_uuid = tracing::field::Empty,
            category_uuid = %details.category_uuid
        ),
        err
    )]
    async fn create_product(
        &self,
        details: ProductDetails,
        point_in_time: Timestamp,
    ) -> Result<Product, CatalogServiceError> {
        let details = details.prepare_for_save()?;

        bounded::<_, CatalogServiceError, _>(
            self.timeout,
            self.repository.get_category(details.category_uuid),
        )
        .await?
        .ok_or(CatalogServiceError::CategoryNotFound)?;

        let product = Product {
            uuid: ProductUuid::new(),
            details,
            created_at: point_in_time,
        };

        Span::current().record("product_uuid", tracing::field::display(product.uuid));

        bounded::<_, CatalogServiceError, _>(
            self.timeout,
            self.repository.create_product(&product),
        )
        .await?;

        info!("created product");

        Ok(product)
    }

    #[tracing::instrument(
        name = "catalog.service.update_product",
        skip(self, details),
        fields(product_uuid = %product),
        err
    )]
    async fn update_product(
        &self,
        product: ProductUuid,
        details: ProductDetails,
    ) -> Result<(), CatalogServiceError> {
        let details = details.prepare_for_save()?;

        let rows_affected = bounded::<_, CatalogServiceError, _>(
            self.timeout,
            self.repository.update_product(product, &details),
        )
        .await?;

        if rows_affected == 0 {
            return Err(CatalogServiceError::ProductNotFound);
        }

        info!("updated product");

        Ok(())
    }

    #[tracing::instrument(
        name = "catalog.service.delete_product",
        skip(self),
        fields(product_uuid = %product),
        err
    )]
    async fn delete_product(&self, product: ProductUuid) -> Result<(), CatalogServiceError> {
        let rows_affected = bounded::<_, CatalogServiceError, _>(
            self.timeout,
            self.repository.delete_product(product),
        )
        .await?;

        if rows_affected == 0 {
            return Err(CatalogServiceError::ProductNotFound);
        }

        info!("deleted product");

        Ok(())
    }

    #[tracing::instrument(
        name = "catalog.service.reorder_products",
        skip(self, products),
        fields(product_count = products.len()),
        err
    )]
    async fn reorder_products(&self, products: Vec<ProductUuid>) -> Result<(), CatalogServiceError> {
        let complete = bounded::<_, CatalogServiceError, _>(
            self.timeout,
            self.repository.reorder_products(products),
        )
        .await?;

        if !complete {
            return Err(CatalogServiceError::ProductNotFound);
        }

        info!("reordered products");

        Ok(())
    }

    #[tracing::instrument(
        name = "catalog.service.create_category",
        skip(self, details),
        fields(category_uuid = tracing::field::Empty, parent_uuid = ?details.parent_uuid),
        err
    )]
    async fn create_category(
        &self,
        details: CategoryDetails,
        point_in_time: Timestamp,
    ) -> Result<Category, CatalogServiceError> {
        self.ensure_parent_exists(details.parent_uuid).await?;

        let category = Category {
            uuid: CategoryUuid::new(),
            details,
            created_at: point_in_time,
        };

        Span::current().record("category_uuid", tracing::field::display(category.uuid));

        bounded::<_, CatalogServiceError, _>(
            self.timeout,
            self.repository.create_category(&category),
        )
        .await?;

        info!("created category");

        Ok(category)
    }

    #[tracing::instrument(
        name = "catalog.service.update_category",
        skip(self, details),
        fields(category_uuid = %category, parent_uuid = ?details.parent_uuid),
        err
    )]
    async fn update_category(
        &self,
        category: CategoryUuid,
        details: CategoryDetails,
    ) -> Result<(), CatalogServiceError> {
        if details.parent_uuid == Some(category) {
            return Err(CatalogServiceError::InvalidParent);
        }

        self.ensure_parent_exists(details.parent_uuid).await?;

        let rows_affected = bounded::<_, CatalogServiceError, _>(
            self.timeout,
            self.repository.update_category(category, &details),
        )
        .await?;

        if rows_affected == 0 {
            return Err(CatalogServiceError::CategoryNotFound);
        }

        info!("updated category");

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Every product, in display order.
    async fn list_products(&self) -> Result<Vec<Product>, CatalogServiceError>;

    /// Products in a category, in display order.
    async fn products_by_category(
        &self,
        category: CategoryUuid,
    ) -> Result<Vec<Product>, CatalogServiceError>;

    /// Retrieve a single product.
    async fn get_product(&self, product: ProductUuid) -> Result<Product, CatalogServiceError>;

    /// Every category.
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogServiceError>;

    /// Direct children of a category.
    async fn subcategories(
        &self,
        parent: CategoryUuid,
    ) -> Result<Vec<Category>, CatalogServiceError>;

    /// Retrieve a single category.
    async fn get_category(&self, category: CategoryUuid) -> Result<Category, CatalogServiceError>;

    /// Delete a category that has no products and no subcategories.
    async fn delete_category(&self, category: CategoryUuid) -> Result<(), CatalogServiceError>;

    /// Add a product to an existing category. At least one image is required.
    async fn create_product(
        &self,
        details: ProductDetails,
        point_in_time: Timestamp,
    ) -> Result<Product, CatalogServiceError>;

    /// Replace a product's document. At least one image is required.
    async fn update_product(
        &self,
        product: ProductUuid,
        details: ProductDetails,
    ) -> Result<(), CatalogServiceError>;

    /// Permanently delete a product.
    async fn delete_product(&self, product: ProductUuid) -> Result<(), CatalogServiceError>;

    /// Pin products to the given display order. All or nothing.
    async fn reorder_products(&self, products: Vec<ProductUuid>) -> Result<(), CatalogServiceError>;

    /// Add a category, optionally under an existing parent.
    async fn create_category(
        &self,
        details: CategoryDetails,
        point_in_time: Timestamp,
    ) -> Result<Category, CatalogServiceError>;

    /// Replace a category's document.
    async fn update_category(
        &self,
        category: CategoryUuid,
        details: CategoryDetails,
    ) -> Result<(), CatalogServiceError>;
}
