//! Test fixtures

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::{
    cart::{CartItem, LineKey},
    customers::Customer,
    products::{CategoryUuid, Product, ProductDetails, ProductUuid},
};

/// A plain, undiscounted product priced in whole units.
pub(crate) fn product(name: &str, price: i64) -> Product {
    Product {
        uuid: ProductUuid::new(),
        details: ProductDetails {
            name: name.to_string(),
            description: String::new(),
            price: Decimal::from(price),
            discount_percentage: None,
            discount_end_date: None,
            category_uuid: CategoryUuid::new(),
            images: Vec::new(),
            image: None,
            featured: false,
            in_stock: true,
            order: None,
        },
        created_at: Timestamp::UNIX_EPOCH,
    }
}

/// A cart line with the given unit price and quantity.
pub(crate) fn line(price: i64, quantity: u32) -> CartItem {
    let price = Decimal::from(price);

    CartItem {
        product_uuid: ProductUuid::new(),
        name: "Item".to_string(),
        price,
        original_price: price,
        discount_percentage: None,
        image: String::new(),
        quantity,
        category_uuid: CategoryUuid::new(),
        selected_size: None,
        selected_color: None,
    }
}

/// The key of a line without variants.
pub(crate) fn key_of(item: &CartItem) -> LineKey {
    item.key()
}

/// A customer that passes the Egyptian phone policy.
pub(crate) fn customer() -> Customer {
    Customer {
        name: "Mona".to_string(),
        phone: "01012345678".to_string(),
        comment: None,
    }
}
