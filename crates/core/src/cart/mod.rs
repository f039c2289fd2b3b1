//! Cart
//!
//! The cart is local, optimistic state: every mutation applies in memory first and is then
//! written to storage. A failed write is logged and otherwise ignored, so the cart stays
//! usable when persistence isn't.

use std::fmt;

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{customers::Customer, storage::KeyValueStorage};

mod items;

pub use items::{CartItem, LineKey};

/// Storage key the cart lines live under.
pub const CART_STORAGE_KEY: &str = "cart";

/// What changed in the cart.
#[derive(Debug, Clone, PartialEq)]
pub enum CartEvent {
    /// A new line was appended.
    ItemAdded(LineKey),

    /// An existing line absorbed more units.
    ItemMerged(LineKey),

    /// A line was removed.
    ItemRemoved(LineKey),

    /// A line's quantity was replaced.
    QuantityUpdated(LineKey),

    /// Lines and staged customer were cleared.
    Cleared,

    /// Customer details were staged for checkout.
    CustomerStaged,

    /// The cart panel should be shown.
    PanelOpened,

    /// The cart panel should be hidden.
    PanelClosed,
}

/// A cart change, as delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct CartChange {
    /// What happened.
    pub event: CartEvent,

    /// Subtotal after the change.
    pub subtotal: Decimal,

    /// Total units after the change.
    pub item_count: u64,
}

/// Outcome of [`CartStore::add_to_cart`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Appended as a new line.
    Added,

    /// Merged into the existing line with the same key.
    Merged,

    /// Zero quantity, nothing changed.
    Ignored,
}

/// Outcome of [`CartStore::update_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityUpdate {
    /// Quantity replaced.
    Updated,

    /// Requested quantity was below one, nothing changed.
    Ignored,

    /// No line has that key.
    NotFound,
}

/// Handle returned by [`CartStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&CartChange) + Send>;

/// The shopping cart.
pub struct CartStore<S: KeyValueStorage> {
    items: Vec<CartItem>,
    customer: Option<Customer>,
    panel_open: bool,
    storage: S,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<S: KeyValueStorage> CartStore<S> {
    /// Rehydrate the cart from storage.
    ///
    /// Unreadable storage yields an empty cart; unreadable lines are dropped.
    pub fn load(storage: S) -> Self {
        let items = match storage.get(CART_STORAGE_KEY) {
            Ok(Some(raw)) => parse_lines(&raw),
            Ok(None) => Vec::new(),
            Err(error) => {
                warn!(%error, "failed to read persisted cart, starting empty");

                Vec::new()
            }
        };

        debug!(line_count = items.len(), "loaded cart");

        Self {
            items,
            customer: None,
            panel_open: false,
            storage,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Add a line, merging into an existing line with the same key.
    ///
    /// Opens the cart panel whenever something was added.
    pub fn add_to_cart(&mut self, item: CartItem) -> AddOutcome {
        if item.quantity == 0 {
            return AddOutcome::Ignored;
        }

        let key = item.key();

        let outcome = match self.items.iter_mut().find(|line| key.matches(line)) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(item.quantity);

                AddOutcome::Merged
            }
            None => {
                self.items.push(item);

                AddOutcome::Added
            }
        };

        debug!(product_uuid = %key.product_uuid, ?outcome, "added to cart");

        self.persist();

        self.notify(match outcome {
            AddOutcome::Merged => CartEvent::ItemMerged(key),
            _ => CartEvent::ItemAdded(key),
        });

        self.open_panel();

        outcome
    }

    /// Remove the line with `key`. Returns whether a line was removed.
    pub fn remove_from_cart(&mut self, key: &LineKey) -> bool {
        let before = self.items.len();

        self.items.retain(|line| !key.matches(line));

        if self.items.len() == before {
            return false;
        }

        debug!(product_uuid = %key.product_uuid, "removed from cart");

        self.persist();
        self.notify(CartEvent::ItemRemoved(key.clone()));

        true
    }

    /// Replace the quantity on the line with `key`.
    ///
    /// Quantities below one are ignored rather than clamped, and never remove the line.
    pub fn update_quantity(&mut self, key: &LineKey, quantity: u32) -> QuantityUpdate {
        if quantity < 1 {
            return QuantityUpdate::Ignored;
        }

        let Some(line) = self.items.iter_mut().find(|line| key.matches(line)) else {
            return QuantityUpdate::NotFound;
        };

        line.quantity = quantity;

        debug!(product_uuid = %key.product_uuid, quantity, "updated cart quantity");

        self.persist();
        self.notify(CartEvent::QuantityUpdated(key.clone()));

        QuantityUpdate::Updated
    }

    /// Empty the cart and forget any staged customer.
    pub fn clear_cart(&mut self) {
        self.items.clear();
        self.customer = None;

        debug!("cleared cart");

        self.persist();
        self.notify(CartEvent::Cleared);
    }

    /// Stage customer details for checkout.
    pub fn set_customer(&mut self, customer: Customer) {
        self.customer = Some(customer);
        self.notify(CartEvent::CustomerStaged);
    }

    /// Staged customer details.
    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    /// Show the cart panel.
    pub fn open_panel(&mut self) {
        self.panel_open = true;
        self.notify(CartEvent::PanelOpened);
    }

    /// Hide the cart panel.
    pub fn close_panel(&mut self) {
        self.panel_open = false;
        self.notify(CartEvent::PanelClosed);
    }

    /// Whether the cart panel is shown.
    pub fn is_panel_open(&self) -> bool {
        self.panel_open
    }

    /// The cart lines, in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// The line with `key`.
    pub fn get(&self, key: &LineKey) -> Option<&CartItem> {
        self.items.iter().find(|line| key.matches(line))
    }

    /// An owned copy of the lines, safe to keep after the cart changes.
    pub fn snapshot(&self) -> Vec<CartItem> {
        self.items.clone()
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of price times quantity over all lines, saturating at [`Decimal::MAX`].
    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .map(CartItem::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Cart total. Delivery is quoted separately at checkout, so this equals the subtotal.
    pub fn total(&self) -> Decimal {
        self.subtotal()
    }

    /// Call `listener` after every change.
    pub fn subscribe(&mut self, listener: impl FnMut(&CartChange) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);

        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));

        id
    }

    /// Stop calling a listener. Returns whether it was subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();

        self.listeners.retain(|(listener_id, _)| *listener_id != id);

        self.listeners.len() != before
    }

    /// The storage backing this cart.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn persist(&mut self) {
        if let Err(error) = self.storage.set_json(CART_STORAGE_KEY, &self.items) {
            warn!(%error, "failed to persist cart");
        }
    }

    fn notify(&mut self, event: CartEvent) {
        if self.listeners.is_empty() {
            return;
        }

        let change = CartChange {
            event,
            subtotal: self.subtotal(),
            item_count: self.item_count(),
        };

        for (_, listener) in &mut self.listeners {
            listener(&change);
        }
    }
}

impl<S: KeyValueStorage + fmt::Debug> fmt::Debug for CartStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("items", &self.items)
            .field("customer", &self.customer)
            .field("panel_open", &self.panel_open)
            .field("storage", &self.storage)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

fn parse_lines(raw: &str) -> Vec<CartItem> {
    let values = match serde_json::from_str::<Vec<Value>>(raw) {
        Ok(values) => values,
        Err(error) => {
            warn!(%error, "persisted cart is not a list, starting empty");

            return Vec::new();
        }
    };

    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<CartItem>(value) {
            Ok(item) if item.quantity < 1 => {
                warn!(product_uuid = %item.product_uuid, "dropping persisted cart line without quantity");

                None
            }
            Ok(item) if item.checked_line_total().is_none() => {
                warn!(product_uuid = %item.product_uuid, "dropping persisted cart line with out of range price");

                None
            }
            Ok(item) => Some(item),
            Err(error) => {
                warn!(%error, "dropping unreadable persisted cart line");

                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;
    use testresult::TestResult;

    use crate::{
        fixtures::{customer, key_of, line},
        products::{CategoryUuid, ProductUuid},
        storage::{MemoryStorage, StorageError},
    };

    use super::*;

    #[derive(Debug, Default)]
    struct FailingStorage;

    impl KeyValueStorage for FailingStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("quota exceeded")))
        }

        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    fn empty_cart() -> CartStore<MemoryStorage> {
        CartStore::load(MemoryStorage::new())
    }

    #[test]
    fn adding_same_key_twice_merges_quantities() {
        let mut cart = empty_cart();
        let item = line(10, 1);

        assert_eq!(cart.add_to_cart(item.clone()), AddOutcome::Added);
        assert_eq!(cart.add_to_cart(item.clone()), AddOutcome::Merged);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(&key_of(&item)).map(|l| l.quantity), Some(2));
    }

    #[test]
    fn different_variants_are_separate_lines() {
        let mut cart = empty_cart();
        let small = line(10, 1).with_variant(Some("S".to_string()), None);
        let large = small.clone().with_variant(Some("L".to_string()), None);

        cart.add_to_cart(small);
        cart.add_to_cart(large);

        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn adding_opens_the_panel() {
        let mut cart = empty_cart();

        assert!(!cart.is_panel_open());

        cart.add_to_cart(line(10, 1));
        assert!(cart.is_panel_open());

        cart.close_panel();
        assert!(!cart.is_panel_open());
    }

    #[test]
    fn zero_quantity_add_is_ignored() {
        let mut cart = empty_cart();

        assert_eq!(cart.add_to_cart(line(10, 0)), AddOutcome::Ignored);
        assert!(cart.is_empty());
        assert!(!cart.is_panel_open());
    }

    #[test]
    fn remove_missing_key_is_a_no_op() {
        let mut cart = empty_cart();
        let kept = line(10, 1);

        cart.add_to_cart(kept.clone());

        assert!(!cart.remove_from_cart(&LineKey::product(ProductUuid::new())));
        assert!(cart.remove_from_cart(&key_of(&kept)));
        assert!(cart.is_empty());
    }

    #[test]
    fn quantity_below_one_is_ignored() {
        let mut cart = empty_cart();
        let item = line(10, 3);
        let key = key_of(&item);

        cart.add_to_cart(item);

        assert_eq!(cart.update_quantity(&key, 0), QuantityUpdate::Ignored);
        assert_eq!(cart.get(&key).map(|l| l.quantity), Some(3));
        assert_eq!(cart.update_quantity(&key, 5), QuantityUpdate::Updated);
        assert_eq!(cart.get(&key).map(|l| l.quantity), Some(5));
        assert_eq!(
            cart.update_quantity(&LineKey::product(ProductUuid::new()), 2),
            QuantityUpdate::NotFound
        );
    }

    #[test]
    fn subtotal_sums_lines() {
        let mut cart = empty_cart();

        cart.add_to_cart(line(10, 2));
        cart.add_to_cart(line(5, 3));

        assert_eq!(cart.subtotal(), Decimal::from(35));
        assert_eq!(cart.total(), cart.subtotal());
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn clear_drops_lines_and_customer() {
        let mut cart = empty_cart();

        cart.add_to_cart(line(10, 1));
        cart.set_customer(customer());
        cart.clear_cart();

        assert!(cart.is_empty());
        assert!(cart.customer().is_none());
        assert_eq!(cart.subtotal(), Decimal::ZERO);
    }

    #[test]
    fn mutations_are_persisted_and_rehydrated() -> TestResult {
        let mut cart = empty_cart();
        let item = line(7, 2);

        cart.add_to_cart(item.clone());

        let storage = cart.storage().clone();
        let reloaded = CartStore::load(storage);

        assert_eq!(reloaded.items(), [item].as_slice());

        Ok(())
    }

    #[test]
    fn rehydration_coerces_string_prices_and_drops_bad_lines() -> TestResult {
        let mut storage = MemoryStorage::new();
        let raw = json!([
            {
                "productUuid": ProductUuid::new(),
                "name": "Mug",
                "price": "12.50",
                "originalPrice": "12.50",
                "quantity": 2,
                "categoryUuid": CategoryUuid::new(),
            },
            { "name": "broken" },
            {
                "productUuid": ProductUuid::new(),
                "name": "Zero",
                "price": 1,
                "originalPrice": 1,
                "quantity": 0,
                "categoryUuid": CategoryUuid::new(),
            },
        ]);

        storage.set(CART_STORAGE_KEY, &raw.to_string())?;

        let cart = CartStore::load(storage);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.subtotal(), Decimal::from(25));

        Ok(())
    }

    #[test]
    fn out_of_range_persisted_prices_never_panic() -> TestResult {
        let mut storage = MemoryStorage::new();
        let raw = json!([
            {
                "productUuid": ProductUuid::new(),
                "name": "Overflowing",
                "price": "79228162514264337593543950335",
                "originalPrice": "79228162514264337593543950335",
                "quantity": 2,
                "categoryUuid": CategoryUuid::new(),
            },
            {
                "productUuid": ProductUuid::new(),
                "name": "Huge",
                "price": "79228162514264337593543950335",
                "originalPrice": "79228162514264337593543950335",
                "quantity": 1,
                "categoryUuid": CategoryUuid::new(),
            },
        ]);

        storage.set(CART_STORAGE_KEY, &raw.to_string())?;

        let mut cart = CartStore::load(storage);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        assert_eq!(cart.len(), 1, "the overflowing line is dropped on load");

        cart.subscribe(move |change| {
            if let Ok(mut seen) = sink.lock() {
                seen.push(change.subtotal);
            }
        });

        let extra = line(10, 3);

        cart.add_to_cart(extra.clone());
        cart.update_quantity(&key_of(&extra), 5);

        let seen = seen.lock().map(|seen| seen.clone()).unwrap_or_default();

        assert_eq!(cart.subtotal(), Decimal::MAX);
        assert!(!seen.is_empty(), "subscribers were notified");
        assert!(
            seen.iter().all(|subtotal| *subtotal == Decimal::MAX),
            "subtotal saturates: {seen:?}"
        );

        cart.clear_cart();

        assert_eq!(cart.subtotal(), Decimal::ZERO);

        Ok(())
    }

    #[test]
    fn garbage_in_storage_yields_empty_cart() -> TestResult {
        let mut storage = MemoryStorage::new();

        storage.set(CART_STORAGE_KEY, "{not json")?;

        assert!(CartStore::load(storage).is_empty());

        Ok(())
    }

    #[test]
    fn failed_persistence_keeps_in_memory_state() {
        let mut cart = CartStore::load(FailingStorage);

        cart.add_to_cart(line(10, 1));
        cart.add_to_cart(line(20, 1));

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.subtotal(), Decimal::from(30));
    }

    #[test]
    fn snapshot_is_not_aliased() {
        let mut cart = empty_cart();
        let item = line(10, 1);

        cart.add_to_cart(item.clone());

        let snapshot = cart.snapshot();

        cart.update_quantity(&key_of(&item), 9);

        assert_eq!(snapshot.first().map(|l| l.quantity), Some(1));
    }

    #[test]
    fn subscribers_see_changes_until_unsubscribed() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut cart = empty_cart();

        let id = cart.subscribe(move |change| {
            if let Ok(mut events) = sink.lock() {
                events.push((change.event.clone(), change.subtotal));
            }
        });

        let item = line(4, 1);

        cart.add_to_cart(item.clone());

        assert!(cart.unsubscribe(id));

        cart.clear_cart();

        let events = seen.lock().map(|events| events.clone()).unwrap_or_default();

        assert_eq!(
            events,
            vec![
                (CartEvent::ItemAdded(key_of(&item)), Decimal::from(4)),
                (CartEvent::PanelOpened, Decimal::from(4)),
            ]
        );
    }
}
