//! Favourites
//!
//! Saved products, kept by value so the list renders without a catalogue read.

use tracing::warn;

use crate::{
    products::{Product, ProductUuid},
    storage::KeyValueStorage,
};

/// Storage key the favourites live under.
pub const FAVORITES_STORAGE_KEY: &str = "favorites";

/// Products the shopper has marked as favourites, in the order they were added.
#[derive(Debug)]
pub struct FavoritesStore<S: KeyValueStorage> {
    products: Vec<Product>,
    storage: S,
}

impl<S: KeyValueStorage> FavoritesStore<S> {
    /// Rehydrate favourites from storage, starting empty when they can't be read.
    pub fn load(storage: S) -> Self {
        let products = match storage.get(FAVORITES_STORAGE_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<Vec<Product>>(&raw).unwrap_or_else(|error| {
                warn!(%error, "persisted favourites are unreadable, starting empty");

                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(error) => {
                warn!(%error, "failed to read persisted favourites, starting empty");

                Vec::new()
            }
        };

        let mut store = Self {
            products: Vec::with_capacity(products.len()),
            storage,
        };

        for product in products {
            if !store.contains(product.uuid) {
                store.products.push(product);
            }
        }

        store
    }

    /// Add a product. Returns `false` when it was already a favourite.
    pub fn add(&mut self, product: Product) -> bool {
        if self.contains(product.uuid) {
            return false;
        }

        self.products.push(product);
        self.persist();

        true
    }

    /// Remove a product. Returns whether it was a favourite.
    pub fn remove(&mut self, uuid: ProductUuid) -> bool {
        let before = self.products.len();

        self.products.retain(|product| product.uuid != uuid);

        if self.products.len() == before {
            return false;
        }

        self.persist();

        true
    }

    /// Flip a product's favourite state. Returns whether it is now a favourite.
    pub fn toggle(&mut self, product: Product) -> bool {
        if self.remove(product.uuid) {
            return false;
        }

        self.add(product)
    }

    /// Whether the product is a favourite.
    pub fn contains(&self, uuid: ProductUuid) -> bool {
        self.products.iter().any(|product| product.uuid == uuid)
    }

    /// Favourite products in the order they were added.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Number of favourites.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether there are no favourites.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// The storage backing these favourites.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn persist(&mut self) {
        if let Err(error) = self.storage.set_json(FAVORITES_STORAGE_KEY, &self.products) {
            warn!(%error, "failed to persist favourites");
        }
    }
}
