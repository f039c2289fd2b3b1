//! Checkout
//!
//! Turns a cart and its staged customer into an order draft. The delivery cost is quoted from
//! the settings current at checkout and folded into the draft's total, which never changes
//! afterwards.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    cart::CartStore,
    customers::{CustomerError, validate_customer},
    delivery::{DeliverySettings, calculate_delivery_cost},
    orders::NewOrder,
    phone::PhonePolicy,
    storage::KeyValueStorage,
};

/// What the shopper will pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    /// Sum of the cart lines.
    pub subtotal: Decimal,

    /// Delivery cost for that subtotal.
    pub delivery: Decimal,

    /// Subtotal plus delivery.
    pub total: Decimal,
}

impl Quote {
    /// Quote a subtotal against the delivery settings.
    pub fn for_subtotal(subtotal: Decimal, settings: Option<&DeliverySettings>) -> Self {
        let delivery = calculate_delivery_cost(settings, subtotal);

        Self {
            subtotal,
            delivery,
            total: subtotal.saturating_add(delivery),
        }
    }
}

/// Why checkout was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("Your cart is empty")]
    EmptyCart,

    /// No customer details have been staged.
    #[error("Customer details are required")]
    MissingCustomer,

    /// The staged customer details are invalid.
    #[error(transparent)]
    Customer(#[from] CustomerError),
}

/// Build an order draft from the cart.
///
/// The draft holds its own copy of the lines, so later cart changes don't reach it.
///
/// # Errors
///
/// Returns an error when the cart is empty or the staged customer is missing or invalid.
pub fn prepare_order<S: KeyValueStorage>(
    cart: &CartStore<S>,
    policy: PhonePolicy,
    settings: Option<&DeliverySettings>,
) -> Result<NewOrder, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let customer = cart.customer().ok_or(CheckoutError::MissingCustomer)?;

    validate_customer(policy, customer)?;

    let quote = Quote::for_subtotal(cart.subtotal(), settings);

    Ok(NewOrder {
        items: cart.snapshot(),
        customer: customer.clone(),
        total: quote.total,
        comment: customer.comment().map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        customers::Customer,
        fixtures::{customer, key_of, line},
        phone::PhoneError,
        storage::MemoryStorage,
    };

    use super::*;

    fn settings() -> DeliverySettings {
        DeliverySettings {
            base_cost: Decimal::from(30),
            free_delivery_threshold: Decimal::from(500),
        }
    }

    #[test]
    fn quote_adds_delivery_below_threshold() {
        let quote = Quote::for_subtotal(Decimal::from(100), Some(&settings()));

        assert_eq!(quote.delivery, Decimal::from(30));
        assert_eq!(quote.total, Decimal::from(130));
    }

    #[test]
    fn draft_total_includes_delivery_and_comment() -> TestResult {
        let mut cart = CartStore::load(MemoryStorage::new());

        cart.add_to_cart(line(40, 2));
        cart.set_customer(Customer {
            comment: Some(" leave at door ".to_string()),
            ..customer()
        });

        let draft = prepare_order(&cart, PhonePolicy::Egyptian, Some(&settings()))?;

        assert_eq!(draft.total, Decimal::from(110));
        assert_eq!(draft.comment.as_deref(), Some("leave at door"));

        Ok(())
    }

    #[test]
    fn empty_cart_is_refused() {
        let mut cart = CartStore::load(MemoryStorage::new());

        cart.set_customer(customer());

        assert_eq!(
            prepare_order(&cart, PhonePolicy::Egyptian, None),
            Err(CheckoutError::EmptyCart)
        );
    }

    #[test]
    fn invalid_customer_blocks_checkout() {
        let mut cart = CartStore::load(MemoryStorage::new());

        cart.add_to_cart(line(40, 1));

        assert_eq!(
            prepare_order(&cart, PhonePolicy::Egyptian, None),
            Err(CheckoutError::MissingCustomer)
        );

        cart.set_customer(Customer {
            phone: "123".to_string(),
            ..customer()
        });

        assert_eq!(
            prepare_order(&cart, PhonePolicy::Egyptian, None),
            Err(CheckoutError::Customer(CustomerError::Phone(
                PhoneError::Length(11)
            )))
        );
    }

    #[test]
    fn draft_items_are_a_snapshot() -> TestResult {
        let mut cart = CartStore::load(MemoryStorage::new());
        let item = line(10, 1);

        cart.add_to_cart(item.clone());
        cart.set_customer(customer());

        let draft = prepare_order(&cart, PhonePolicy::Egyptian, None)?;

        cart.update_quantity(&key_of(&item), 7);
        cart.clear_cart();

        assert_eq!(draft.items, vec![item]);

        Ok(())
    }
}
