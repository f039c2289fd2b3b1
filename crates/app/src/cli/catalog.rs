use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::{Args, Subcommand};
use jiff::Timestamp;
use storefront::{
    discounts::{effective_price, round_for_display},
    products::{CategoryDetails, CategoryUuid, ProductDetails, ProductUuid},
};
use storefront_app::context::AppContext;

#[derive(Debug, Args)]
pub(crate) struct CatalogCommand {
    #[command(subcommand)]
    command: CatalogSubcommand,
}

#[derive(Debug, Subcommand)]
enum CatalogSubcommand {
    /// List products in display order with their current prices
    Products(ProductsArgs),
    /// List categories
    Categories(CategoriesArgs),
    /// Delete an empty category
    DeleteCategory(DeleteCategoryArgs),
    /// Add a product from a JSON document
    AddProduct(AddProductArgs),
    /// Replace a product with a JSON document
    UpdateProduct(UpdateProductArgs),
    /// Permanently delete a product
    DeleteProduct(DeleteProductArgs),
    /// Pin products to the given display order
    Reorder(ReorderArgs),
    /// Add a category
    AddCategory(CategoryArgs),
    /// Replace a category
    UpdateCategory(UpdateCategoryArgs),
}

#[derive(Debug, Args)]
struct ProductsArgs {
    /// Only products in this category
    #[arg(long)]
    category: Option<CategoryUuid>,
}

#[derive(Debug, Args)]
struct CategoriesArgs {
    /// Only direct children of this category
    #[arg(long)]
    parent: Option<CategoryUuid>,
}

#[derive(Debug, Args)]
struct DeleteCategoryArgs {
    category_uuid: CategoryUuid,
}

#[derive(Debug, Args)]
struct AddProductArgs {
    /// Path to the product document
    file: PathBuf,
}

#[derive(Debug, Args)]
struct UpdateProductArgs {
    product_uuid: ProductUuid,

    /// Path to the product document
    file: PathBuf,
}

#[derive(Debug, Args)]
struct DeleteProductArgs {
    product_uuid: ProductUuid,
}

#[derive(Debug, Args)]
struct ReorderArgs {
    /// Products, first shown first
    #[arg(required = true)]
    product_uuids: Vec<ProductUuid>,
}

#[derive(Debug, Args)]
struct CategoryArgs {
    #[arg(long)]
    name: String,

    #[arg(long, default_value = "")]
    description: String,

    /// Cover image URL
    #[arg(long)]
    image: Option<String>,

    /// Make this a subcategory of an existing category
    #[arg(long)]
    parent: Option<CategoryUuid>,
}

impl From<CategoryArgs> for CategoryDetails {
    fn from(args: CategoryArgs) -> Self {
        Self {
            name: args.name,
            description: args.description,
            image: args.image,
            parent_uuid: args.parent,
        }
    }
}

#[derive(Debug, Args)]
struct UpdateCategoryArgs {
    category_uuid: CategoryUuid,

    #[command(flatten)]
    category: CategoryArgs,
}

pub(crate) async fn run(ctx: &AppContext, command: CatalogCommand) -> Result<(), String> {
    match command.command {
        CatalogSubcommand::Products(args) => products(ctx, args).await,
        CatalogSubcommand::Categories(args) => categories(ctx, args).await,
        CatalogSubcommand::DeleteCategory(args) => {
            ctx.catalog
                .delete_category(args.category_uuid)
                .await
                .map_err(|error| format!("failed to delete category: {error}"))?;

            println!("{}: deleted", args.category_uuid);

            Ok(())
        }
        CatalogSubcommand::AddProduct(args) => {
            let product = ctx
                .catalog
                .create_product(read_product(&args.file)?, Timestamp::now())
                .await
                .map_err(|error| format!("failed to add product: {error}"))?;

            println!("{}: created", product.uuid);

            Ok(())
        }
        CatalogSubcommand::UpdateProduct(args) => {
            ctx.catalog
                .update_product(args.product_uuid, read_product(&args.file)?)
                .await
                .map_err(|error| format!("failed to update product: {error}"))?;

            println!("{}: updated", args.product_uuid);

            Ok(())
        }
        CatalogSubcommand::DeleteProduct(args) => {
            ctx.catalog
                .delete_product(args.product_uuid)
                .await
                .map_err(|error| format!("failed to delete product: {error}"))?;

            println!("{}: deleted", args.product_uuid);

            Ok(())
        }
        CatalogSubcommand::Reorder(args) => {
            let count = args.product_uuids.len();

            ctx.catalog
                .reorder_products(args.product_uuids)
                .await
                .map_err(|error| format!("failed to reorder products: {error}"))?;

            println!("reordered {count} products");

            Ok(())
        }
        CatalogSubcommand::AddCategory(args) => {
            let category = ctx
                .catalog
                .create_category(args.into(), Timestamp::now())
                .await
                .map_err(|error| format!("failed to add category: {error}"))?;

            println!("{}: created", category.uuid);

            Ok(())
        }
        CatalogSubcommand::UpdateCategory(args) => {
            ctx.catalog
                .update_category(args.category_uuid, args.category.into())
                .await
                .map_err(|error| format!("failed to update category: {error}"))?;

            println!("{}: updated", args.category_uuid);

            Ok(())
        }
    }
}

fn read_product(path: &Path) -> Result<ProductDetails, String> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("failed to read {}: {error}", path.display()))?;

    serde_json::from_str(&raw)
        .map_err(|error| format!("invalid product document {}: {error}", path.display()))
}

async fn products(ctx: &AppContext, args: ProductsArgs) -> Result<(), String> {
    let products = match args.category {
        Some(category) => ctx.catalog.products_by_category(category).await,
        None => ctx.catalog.list_products().await,
    }
    .map_err(|error| format!("failed to list products: {error}"))?;

    let now = Timestamp::now();

    for product in products {
        let pricing = effective_price(&product.details, now);

        let discount = pricing
            .discount_percentage
            .map(|percentage| format!(" (-{percentage}% from {})", pricing.original_price))
            .unwrap_or_default();

        println!(
            "{}  {}  {}{}{}",
            product.uuid,
            product.details.name,
            round_for_display(pricing.price),
            discount,
            if product.details.in_stock {
                ""
            } else {
                "  [out of stock]"
            }
        );
    }

    Ok(())
}

async fn categories(ctx: &AppContext, args: CategoriesArgs) -> Result<(), String> {
    let categories = match args.parent {
        Some(parent) => ctx.catalog.subcategories(parent).await,
        None => ctx.catalog.list_categories().await,
    }
    .map_err(|error| format!("failed to list categories: {error}"))?;

    for category in categories {
        println!("{}  {}", category.uuid, category.details.name);
    }

    Ok(())
}
