//! Cart synchronization.
//!
//! A [`CartSync`] holds one user's cart (entries joined with their products)
//! and keeps it consistent with the `cart_items` table. Every mutation is
//! written to the store first; local state only changes once the write has
//! succeeded.
//!
//! Mutations for the same user are serialized through [`CartLocks`]. An
//! insert that still loses a race (another process, same user) hits the
//! `(user_id, product_id)` unique constraint and falls back to incrementing
//! the row that won.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::instrument;

use minimart_backend::{
    CartItem, DataClient, Direction, Filter, Identity, NewCartItem, Product, Query,
    QuantityPatch, RepositoryError, Table,
};
use minimart_core::{CartItemId, CurrencyCode, Price, ProductId, UserId};

/// Largest quantity a single cart entry may hold.
pub const MAX_QUANTITY: i32 = 999;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("authorization required")]
    AuthorizationRequired,

    #[error("quantity cannot exceed {}", MAX_QUANTITY)]
    QuantityTooLarge,

    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("cart entry not found: {0}")]
    EntryNotFound(CartItemId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// One cart entry and the product it points at.
///
/// `product` is `None` when the product row could not be resolved (deleted,
/// or unreadable); such lines stay visible but are worth nothing.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub entry: CartItem,
    pub product: Option<Product>,
}

impl CartLine {
    /// Quantity times unit price, or zero for an unresolved product.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.as_ref().map_or(Price::zero(CurrencyCode::PHP), |p| {
            p.unit_price().times(i64::from(self.entry.quantity))
        })
    }
}

/// Totals shown at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub item_count: i64,
    pub subtotal: Price,
    pub delivery_fee: Price,
    pub total: Price,
}

/// Local view of a user's cart.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn line(&self, entry_id: CartItemId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.entry.id == entry_id)
    }

    /// Sum of line totals.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.lines
            .iter()
            .map(CartLine::line_total)
            .fold(Price::zero(CurrencyCode::PHP), |total, line| total + line)
    }

    /// Sum of quantities over lines whose product resolved.
    #[must_use]
    pub fn total_items(&self) -> i64 {
        self.lines
            .iter()
            .filter(|l| l.product.is_some())
            .map(|l| i64::from(l.entry.quantity))
            .sum()
    }

    /// Products currently in the cart.
    #[must_use]
    pub fn product_ids(&self) -> HashSet<ProductId> {
        self.lines.iter().map(|l| l.entry.product_id).collect()
    }

    /// Checkout totals. The delivery fee only applies to a non-empty cart.
    #[must_use]
    pub fn summary(&self, delivery_fee: Decimal) -> CartSummary {
        let subtotal = self.total_price();
        let delivery_fee = if self.is_empty() {
            Price::zero(CurrencyCode::PHP)
        } else {
            Price::php(delivery_fee)
        };
        CartSummary {
            item_count: self.total_items(),
            subtotal,
            delivery_fee,
            total: subtotal + delivery_fee,
        }
    }

    /// Replace the line for `entry.id` (keeping its product) or append a new one.
    fn upsert(&mut self, entry: CartItem, product: Option<Product>) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.entry.id == entry.id) {
            line.entry = entry;
            if product.is_some() {
                line.product = product;
            }
        } else {
            self.lines.push(CartLine { entry, product });
        }
    }

    fn remove(&mut self, entry_id: CartItemId) {
        self.lines.retain(|l| l.entry.id != entry_id);
    }
}

/// Per-user single-writer locks for cart mutations.
///
/// Locks are created on demand and dropped after a period of inactivity.
#[derive(Clone)]
pub struct CartLocks {
    locks: Cache<UserId, Arc<Mutex<()>>>,
}

impl Default for CartLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl CartLocks {
    #[must_use]
    pub fn new() -> Self {
        let locks = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(Duration::from_secs(600)) // 10 minutes
            .build();
        Self { locks }
    }

    /// Wait for exclusive access to `user`'s cart.
    pub async fn acquire(&self, user: UserId) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .get_with(user, async { Arc::new(Mutex::new(())) })
            .await;
        lock.lock_owned().await
    }
}

/// A user's cart kept in step with the remote `cart_items` table.
pub struct CartSync {
    identity: Identity,
    client: Arc<dyn DataClient>,
    locks: CartLocks,
    cart: Cart,
}

impl CartSync {
    /// Load the cart of `identity`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::AuthorizationRequired` when there is no identity,
    /// or the store's error if loading fails.
    #[instrument(skip_all, fields(user_id = ?identity.map(|i| i.id)))]
    pub async fn open(
        client: Arc<dyn DataClient>,
        locks: CartLocks,
        identity: Option<&Identity>,
    ) -> Result<Self, CartError> {
        let identity = identity.ok_or(CartError::AuthorizationRequired)?.clone();
        let cart = load(client.as_ref(), identity.id).await?;
        Ok(Self {
            identity,
            client,
            locks,
            cart,
        })
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn into_cart(self) -> Cart {
        self.cart
    }

    fn owned_by_me(&self, entry_id: CartItemId) -> [Filter; 2] {
        [
            Filter::eq("id", entry_id),
            Filter::eq("user_id", self.identity.id),
        ]
    }

    /// Add one unit of `product_id`: increment the existing entry or create one.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` if the product does not exist,
    /// `CartError::QuantityTooLarge` if the entry is already full, or the
    /// store's error if a read or write fails.
    #[instrument(skip(self), fields(user_id = %self.identity.id))]
    pub async fn add_to_cart(&mut self, product_id: ProductId) -> Result<&CartLine, CartError> {
        let _guard = self.locks.acquire(self.identity.id).await;
        let client = self.client.as_ref();

        let product = Table::<Product>::new(client)
            .get(product_id)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))?;

        let lookup = Query::new()
            .eq("user_id", self.identity.id)
            .eq("product_id", product_id);
        let entries = Table::<CartItem>::new(client);

        let entry = match entries.find(lookup.clone()).await? {
            Some(existing) => increment(entries, existing).await?,
            None => {
                let new = NewCartItem {
                    user_id: self.identity.id,
                    product_id,
                    quantity: 1,
                };
                match entries.insert(&new).await {
                    Ok(created) => created,
                    Err(e) if e.is_conflict() => {
                        tracing::debug!(%product_id, "Cart insert raced, incrementing winner");
                        let existing = entries.find(lookup).await?.ok_or(RepositoryError::NotFound)?;
                        increment(entries, existing).await?
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        let entry_id = entry.id;
        tracing::info!(%product_id, quantity = entry.quantity, "Added to cart");
        self.cart.upsert(entry, Some(product));
        self.cart
            .line(entry_id)
            .ok_or(CartError::EntryNotFound(entry_id))
    }

    /// Set the quantity of an entry. Zero or less removes it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::QuantityTooLarge` above [`MAX_QUANTITY`],
    /// `CartError::EntryNotFound` if the entry is not in this cart, or the
    /// store's error if the write fails.
    #[instrument(skip(self), fields(user_id = %self.identity.id))]
    pub async fn update_quantity(
        &mut self,
        entry_id: CartItemId,
        quantity: i32,
    ) -> Result<(), CartError> {
        if quantity <= 0 {
            return self.remove_item(entry_id).await;
        }
        if quantity > MAX_QUANTITY {
            return Err(CartError::QuantityTooLarge);
        }

        let _guard = self.locks.acquire(self.identity.id).await;
        let entries = Table::<CartItem>::new(self.client.as_ref());
        let entry = entries
            .update(&QuantityPatch { quantity }, &self.owned_by_me(entry_id))
            .await?
            .into_iter()
            .next()
            .ok_or(CartError::EntryNotFound(entry_id))?;

        let product = if self.cart.line(entry_id).is_some() {
            None
        } else {
            Table::<Product>::new(self.client.as_ref())
                .get(entry.product_id)
                .await?
        };
        self.cart.upsert(entry, product);
        Ok(())
    }

    /// Delete an entry from this cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::EntryNotFound` if the entry is not in this cart, or
    /// the store's error if the delete fails.
    #[instrument(skip(self), fields(user_id = %self.identity.id))]
    pub async fn remove_item(&mut self, entry_id: CartItemId) -> Result<(), CartError> {
        let _guard = self.locks.acquire(self.identity.id).await;
        let removed = Table::<CartItem>::new(self.client.as_ref())
            .delete(&self.owned_by_me(entry_id))
            .await?;
        if removed == 0 {
            return Err(CartError::EntryNotFound(entry_id));
        }
        self.cart.remove(entry_id);
        Ok(())
    }
}

async fn increment(entries: Table<'_, CartItem>, entry: CartItem) -> Result<CartItem, CartError> {
    let quantity = entry
        .quantity
        .checked_add(1)
        .filter(|q| *q <= MAX_QUANTITY)
        .ok_or(CartError::QuantityTooLarge)?;
    let patch = QuantityPatch { quantity };
    entries
        .update(
            &patch,
            &[Filter::eq("id", entry.id), Filter::eq("user_id", entry.user_id)],
        )
        .await?
        .into_iter()
        .next()
        .ok_or(CartError::EntryNotFound(entry.id))
}

/// Entries for `user` (oldest first) joined with their products.
async fn load(client: &dyn DataClient, user: UserId) -> Result<Cart, RepositoryError> {
    let entries = Table::<CartItem>::new(client)
        .select(
            &Query::new()
                .eq("user_id", user)
                .order_by("created_at", Direction::Ascending),
        )
        .await?;
    if entries.is_empty() {
        return Ok(Cart::default());
    }

    let ids: Vec<ProductId> = entries.iter().map(|e| e.product_id).collect();
    let products = Table::<Product>::new(client)
        .select_lenient(&Query::new().is_in("id", ids))
        .await?;

    let lines = entries
        .into_iter()
        .map(|entry| {
            let product = products.iter().find(|p| p.id == entry.product_id).cloned();
            if product.is_none() {
                tracing::warn!(entry_id = %entry.id, product_id = %entry.product_id, "Cart entry has no product");
            }
            CartLine { entry, product }
        })
        .collect();
    Ok(Cart { lines })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use minimart_backend::{MemoryClient, ProductFields, Row};
    use minimart_core::Email;

    use super::*;

    /// Store whose next single-row cart lookup misses, as if another
    /// process inserted the entry just after we looked.
    struct LateInsert {
        inner: Arc<MemoryClient>,
        miss_next_lookup: AtomicBool,
    }

    #[async_trait]
    impl DataClient for LateInsert {
        async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, RepositoryError> {
            if table == "cart_items"
                && query.limit == Some(1)
                && self.miss_next_lookup.swap(false, Ordering::SeqCst)
            {
                return Ok(Vec::new());
            }
            self.inner.select(table, query).await
        }

        async fn insert(&self, table: &str, row: Row) -> Result<Row, RepositoryError> {
            self.inner.insert(table, row).await
        }

        async fn update(
            &self,
            table: &str,
            patch: Row,
            filters: &[Filter],
        ) -> Result<Vec<Row>, RepositoryError> {
            self.inner.update(table, patch, filters).await
        }

        async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, RepositoryError> {
            self.inner.delete(table, filters).await
        }

        async fn ping(&self) -> Result<(), RepositoryError> {
            self.inner.ping().await
        }
    }

    fn shopper() -> Identity {
        Identity {
            id: UserId::generate(),
            email: Email::parse("juan@minimart.ph").unwrap(),
        }
    }

    async fn seed_product(client: &dyn DataClient, name: &str, price: Decimal) -> Product {
        Table::<Product>::new(client)
            .insert(&ProductFields {
                name: name.to_owned(),
                description: None,
                price,
                image_url: None,
                category: "Chips".to_owned(),
                stock: 10,
                featured: false,
            })
            .await
            .unwrap()
    }

    async fn open(client: &Arc<MemoryClient>, identity: &Identity) -> CartSync {
        let client: Arc<dyn DataClient> = client.clone();
        CartSync::open(client, CartLocks::new(), Some(identity))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_without_identity_requires_authorization() {
        let client: Arc<dyn DataClient> = Arc::new(MemoryClient::new());
        let result = CartSync::open(client, CartLocks::new(), None).await;
        assert!(matches!(result, Err(CartError::AuthorizationRequired)));
    }

    #[tokio::test]
    async fn test_add_twice_increments_single_entry() {
        let client = Arc::new(MemoryClient::new());
        let chicharon = seed_product(client.as_ref(), "Chicharon", Decimal::new(2500, 2)).await;
        let me = shopper();
        let mut sync = open(&client, &me).await;

        sync.add_to_cart(chicharon.id).await.unwrap();
        let line = sync.add_to_cart(chicharon.id).await.unwrap();
        assert_eq!(line.entry.quantity, 2);

        assert_eq!(sync.cart().lines().len(), 1);
        assert_eq!(sync.cart().total_items(), 2);
        assert_eq!(sync.cart().total_price(), Price::php(Decimal::new(5000, 2)));
        assert_eq!(client.row_count("cart_items").await, 1);

        // A fresh load sees the same thing.
        let reloaded = open(&client, &me).await;
        assert_eq!(reloaded.cart().lines()[0].entry.quantity, 2);
    }

    #[tokio::test]
    async fn test_add_missing_product() {
        let client = Arc::new(MemoryClient::new());
        let mut sync = open(&client, &shopper()).await;
        let result = sync.add_to_cart(ProductId::generate()).await;
        assert!(matches!(result, Err(CartError::ProductNotFound(_))));
        assert!(sync.cart().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_adds_produce_one_entry() {
        let client = Arc::new(MemoryClient::new());
        let polvoron = seed_product(client.as_ref(), "Polvoron", Decimal::new(3500, 2)).await;
        let me = shopper();
        let locks = CartLocks::new();
        let dyn_client: Arc<dyn DataClient> = client.clone();

        let mut a = CartSync::open(dyn_client.clone(), locks.clone(), Some(&me))
            .await
            .unwrap();
        let mut b = CartSync::open(dyn_client, locks, Some(&me)).await.unwrap();

        let (ra, rb) = tokio::join!(a.add_to_cart(polvoron.id), b.add_to_cart(polvoron.id));
        ra.unwrap();
        rb.unwrap();

        let cart = open(&client, &me).await.into_cart();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].entry.quantity, 2);
    }

    #[tokio::test]
    async fn test_add_sees_entries_from_other_sessions() {
        let client = Arc::new(MemoryClient::new());
        let mango = seed_product(client.as_ref(), "Dried Mangoes", Decimal::new(4500, 2)).await;
        let me = shopper();
        // Opened before another session (separate lock set) inserts the entry.
        let mut stale = CartSync::open(client.clone(), CartLocks::new(), Some(&me))
            .await
            .unwrap();
        let mut other = CartSync::open(client.clone(), CartLocks::new(), Some(&me))
            .await
            .unwrap();
        other.add_to_cart(mango.id).await.unwrap();

        let line = stale.add_to_cart(mango.id).await.unwrap();
        assert_eq!(line.entry.quantity, 2);
        assert_eq!(client.row_count("cart_items").await, 1);
    }

    #[tokio::test]
    async fn test_lost_insert_race_increments_winner() {
        let client = Arc::new(MemoryClient::new());
        let ube = seed_product(client.as_ref(), "Ube Halaya", Decimal::new(12000, 2)).await;
        let me = shopper();
        let store = Arc::new(LateInsert {
            inner: client.clone(),
            miss_next_lookup: AtomicBool::new(false),
        });
        let shared: Arc<dyn DataClient> = store.clone();
        let mut late = CartSync::open(shared, CartLocks::new(), Some(&me))
            .await
            .unwrap();

        open(&client, &me).await.add_to_cart(ube.id).await.unwrap();
        store.miss_next_lookup.store(true, Ordering::SeqCst);

        let line = late.add_to_cart(ube.id).await.unwrap();
        assert_eq!(line.entry.quantity, 2);
        assert!(!store.miss_next_lookup.load(Ordering::SeqCst));
        assert_eq!(client.row_count("cart_items").await, 1);
        assert_eq!(late.cart().lines().len(), 1);
        assert_eq!(late.cart().total_price(), Price::php(Decimal::new(24000, 2)));
    }

    #[tokio::test]
    async fn test_quantity_is_capped() {
        let client = Arc::new(MemoryClient::new());
        let chips = seed_product(client.as_ref(), "Banana Chips", Decimal::new(1500, 2)).await;
        let me = shopper();
        let mut sync = open(&client, &me).await;
        let entry_id = sync.add_to_cart(chips.id).await.unwrap().entry.id;

        for quantity in [MAX_QUANTITY + 1, i32::MAX] {
            let result = sync.update_quantity(entry_id, quantity).await;
            assert!(matches!(result, Err(CartError::QuantityTooLarge)));
        }
        assert_eq!(sync.cart().total_items(), 1);

        sync.update_quantity(entry_id, MAX_QUANTITY).await.unwrap();
        let result = sync.add_to_cart(chips.id).await;
        assert!(matches!(result, Err(CartError::QuantityTooLarge)));

        assert_eq!(sync.cart().total_items(), i64::from(MAX_QUANTITY));
        let stored = open(&client, &me).await.into_cart();
        assert_eq!(stored.lines()[0].entry.quantity, MAX_QUANTITY);
    }

    #[tokio::test]
    async fn test_update_quantity_non_positive_removes() {
        let client = Arc::new(MemoryClient::new());
        let chips = seed_product(client.as_ref(), "Banana Chips", Decimal::new(1500, 2)).await;
        let mut sync = open(&client, &shopper()).await;
        let entry_id = sync.add_to_cart(chips.id).await.unwrap().entry.id;

        sync.update_quantity(entry_id, 5).await.unwrap();
        assert_eq!(sync.cart().total_items(), 5);
        assert_eq!(sync.cart().total_price(), Price::php(Decimal::new(7500, 2)));

        sync.update_quantity(entry_id, 0).await.unwrap();
        assert!(sync.cart().is_empty());
        assert_eq!(client.row_count("cart_items").await, 0);

        let result = sync.update_quantity(entry_id, -1).await;
        assert!(matches!(result, Err(CartError::EntryNotFound(_))));
    }

    #[tokio::test]
    async fn test_cannot_touch_another_users_entry() {
        let client = Arc::new(MemoryClient::new());
        let chips = seed_product(client.as_ref(), "Banana Chips", Decimal::new(1500, 2)).await;
        let mut mine = open(&client, &shopper()).await;
        let entry_id = mine.add_to_cart(chips.id).await.unwrap().entry.id;

        let mut theirs = open(&client, &shopper()).await;
        assert!(matches!(
            theirs.update_quantity(entry_id, 9).await,
            Err(CartError::EntryNotFound(_))
        ));
        assert!(matches!(
            theirs.remove_item(entry_id).await,
            Err(CartError::EntryNotFound(_))
        ));
        assert_eq!(client.row_count("cart_items").await, 1);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_local_cart_unchanged() {
        let client = Arc::new(MemoryClient::new());
        let chips = seed_product(client.as_ref(), "Banana Chips", Decimal::new(1500, 2)).await;
        let mut sync = open(&client, &shopper()).await;
        let entry_id = sync.add_to_cart(chips.id).await.unwrap().entry.id;

        client.set_offline(true);
        assert!(sync.update_quantity(entry_id, 3).await.is_err());
        assert!(sync.remove_item(entry_id).await.is_err());
        assert_eq!(sync.cart().total_items(), 1);
    }

    #[tokio::test]
    async fn test_unresolved_product_contributes_nothing() {
        let client = Arc::new(MemoryClient::new());
        let gone = seed_product(client.as_ref(), "Ube Halaya", Decimal::new(12000, 2)).await;
        let kept = seed_product(client.as_ref(), "Chicharon", Decimal::new(2500, 2)).await;
        let me = shopper();
        let mut sync = open(&client, &me).await;
        sync.add_to_cart(gone.id).await.unwrap();
        sync.add_to_cart(kept.id).await.unwrap();

        Table::<Product>::new(client.as_ref())
            .delete_by_id(gone.id)
            .await
            .unwrap();

        let cart = open(&client, &me).await.into_cart();
        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.total_items(), 1);
        assert_eq!(cart.total_price(), Price::php(Decimal::new(2500, 2)));
        assert!(cart.product_ids().contains(&gone.id));
    }

    #[test]
    fn test_empty_cart_totals_and_summary() {
        let cart = Cart::default();
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_price(), Price::zero(CurrencyCode::PHP));
        let summary = cart.summary(Decimal::new(50, 0));
        assert_eq!(summary.delivery_fee, Price::zero(CurrencyCode::PHP));
        assert_eq!(summary.total, Price::zero(CurrencyCode::PHP));
    }

    #[tokio::test]
    async fn test_summary_adds_delivery_fee() {
        let client = Arc::new(MemoryClient::new());
        let chicharon = seed_product(client.as_ref(), "Chicharon", Decimal::new(2500, 2)).await;
        let mut sync = open(&client, &shopper()).await;
        sync.add_to_cart(chicharon.id).await.unwrap();

        let summary = sync.cart().summary(Decimal::new(50, 0));
        assert_eq!(summary.item_count, 1);
        assert_eq!(summary.subtotal, Price::php(Decimal::new(2500, 2)));
        assert_eq!(summary.total, Price::php(Decimal::new(7500, 2)));
    }
}
