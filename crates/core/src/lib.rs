//! Storefront
//!
//! Storefront is the business core of a small e-commerce shop: catalogue pricing with
//! time-boxed discounts, a persisted shopping cart, customer validation, delivery quotes
//! and the order lifecycle.

pub mod cart;
pub mod checkout;
pub mod customers;
pub mod delivery;
pub mod discounts;
pub mod favorites;
pub mod normalize;
pub mod orders;
pub mod phone;
pub mod products;
pub mod storage;
pub mod uuids;

#[cfg(test)]
mod fixtures;
