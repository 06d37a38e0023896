//! Shopping cart with a derived total and a change log.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::CatalogError;
use crate::reactive::{Computed, Scope, Signal};

/// A product that can be put in the cart. Prices are whole currency units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Product {
    pub id: u32,
    pub name: String,
    pub price: u32,
}

impl Product {
    pub fn new(id: u32, name: impl Into<String>, price: u32) -> Self {
        Self {
            id,
            name: name.into(),
            price,
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.price)
    }
}

/// The fixed, non-empty list of products the cart draws from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Product>", into = "Vec<Product>")]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        if products.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { products })
    }

    /// Parse a JSON array of products.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::new(products)
    }

    /// Read a JSON catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Pick a product uniformly at random.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &Product {
        &self.products[rng.gen_range(0..self.products.len())]
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            products: vec![
                Product::new(1, "Product 1", 10),
                Product::new(2, "Product 2", 20),
                Product::new(3, "Product 3", 30),
            ],
        }
    }
}

impl TryFrom<Vec<Product>> for Catalog {
    type Error = CatalogError;

    fn try_from(products: Vec<Product>) -> Result<Self, Self::Error> {
        Self::new(products)
    }
}

impl From<Catalog> for Vec<Product> {
    fn from(catalog: Catalog) -> Self {
        catalog.products
    }
}

/// Receives the full item list every time the cart changes.
pub trait CartObserver: Send + Sync {
    fn items_changed(&self, items: &[Product]);
}

/// Logs cart changes through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl CartObserver for TracingObserver {
    fn items_changed(&self, items: &[Product]) {
        let names: Vec<&str> = items.iter().map(|item| item.name.as_str()).collect();
        info!(count = items.len(), items = ?names, "cart items changed");
    }
}

/// Keeps every snapshot it is handed.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    snapshots: Mutex<Vec<Vec<Product>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<Vec<Product>> {
        self.snapshots.lock().clone()
    }

    pub fn last(&self) -> Option<Vec<Product>> {
        self.snapshots.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.lock().is_empty()
    }
}

impl CartObserver for RecordingObserver {
    fn items_changed(&self, items: &[Product]) {
        self.snapshots.lock().push(items.to_vec());
    }
}

/// A cart whose total and change log follow its item list.
///
/// Every change replaces the item list with a new one, so the observer sees
/// each intermediate state.
pub struct ShoppingCart {
    catalog: Catalog,
    items: Signal<Vec<Product>>,
    total: Computed<u64>,
    scope: Scope,
}

impl ShoppingCart {
    pub fn new(catalog: Catalog, observer: Arc<dyn CartObserver>) -> Self {
        let items: Signal<Vec<Product>> = Signal::new(Vec::new());

        let total = {
            let items = items.clone();
            Computed::new(move || {
                items.with(|items| items.iter().map(|item| u64::from(item.price)).sum::<u64>())
            })
        };

        let scope = Scope::new();
        {
            let items = items.clone();
            scope.effect(move || {
                let snapshot = items.get();
                observer.items_changed(&snapshot);
            });
        }

        Self {
            catalog,
            items,
            total,
            scope,
        }
    }

    /// A cart over the default catalog that logs through `tracing`.
    pub fn with_tracing() -> Self {
        Self::new(Catalog::default(), Arc::new(TracingObserver))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn items(&self) -> Vec<Product> {
        self.items.get()
    }

    pub fn items_signal(&self) -> &Signal<Vec<Product>> {
        &self.items
    }

    /// Sum of the item prices.
    pub fn total(&self) -> u64 {
        self.total.get()
    }

    pub fn total_cell(&self) -> &Computed<u64> {
        &self.total
    }

    pub fn len(&self) -> usize {
        self.items.with(Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.items.with(Vec::is_empty)
    }

    /// Add a random catalog product, returning it.
    pub fn add_to_cart(&self) -> Product {
        self.add_to_cart_with(&mut rand::thread_rng())
    }

    /// Add a catalog product chosen by `rng`, returning it.
    pub fn add_to_cart_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Product {
        let product = self.catalog.pick(rng).clone();
        self.add_product(product.clone());
        product
    }

    /// Append a product.
    pub fn add_product(&self, product: Product) {
        debug!(product = %product, "adding to cart");
        self.items.update(|items| {
            let mut next = Vec::with_capacity(items.len() + 1);
            next.extend_from_slice(items);
            next.push(product);
            next
        });
    }

    /// Remove every item.
    pub fn clear(&self) {
        self.items.set(Vec::new());
    }

    /// Stop observing changes. Reads keep working.
    pub fn dispose(&self) {
        self.scope.dispose();
    }
}

impl fmt::Debug for ShoppingCart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShoppingCart")
            .field("items", &self.items.get_untracked())
            .field("scope", &self.scope)
            .finish()
    }
}
