//! Storefront back-office services over the backend document store.

pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod telemetry;
