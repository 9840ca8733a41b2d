//! The cart store.

use std::num::NonZeroU32;
use std::sync::Arc;

use rocketshoes_core::{Cart, CartSnapshot, ProductId};
use tokio::sync::{Mutex, broadcast, watch};
use tracing::{info, instrument, warn};

use super::{CartError, CartOperation, Catalog, Notification, SnapshotSlot, StockLedger};

/// Buffered notifications per subscriber before the oldest are dropped.
const NOTIFICATION_CAPACITY: usize = 16;

/// Single source of truth for the cart.
///
/// Mutations are serialized: each one holds the writer lock from the moment it
/// reads the current cart until the new cart is committed, remote lookups
/// included, so two in-flight mutations can't overwrite each other. Readers
/// never wait on the lock; they see the last committed cart.
///
/// A mutation either persists and publishes a new cart, or leaves everything
/// untouched and emits exactly one [`Notification`].
pub struct CartStore {
    catalog: Arc<dyn Catalog>,
    stock: Arc<dyn StockLedger>,
    slot: Arc<dyn SnapshotSlot>,
    writer: Mutex<()>,
    state: watch::Sender<Cart>,
    notifications: broadcast::Sender<Notification>,
}

impl CartStore {
    /// Open the store, loading whatever cart the slot holds.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot can't be read or holds a snapshot that
    /// fails to parse or validate. A bad snapshot is never silently replaced.
    pub async fn open(
        catalog: Arc<dyn Catalog>,
        stock: Arc<dyn StockLedger>,
        slot: Arc<dyn SnapshotSlot>,
    ) -> Result<Self, CartError> {
        let cart = match slot.read().await? {
            Some(json) => CartSnapshot::from_json(&json)?.into_cart()?,
            None => Cart::new(),
        };
        info!(items = cart.len(), "Cart loaded");

        let (state, _) = watch::channel(cart);
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);

        Ok(Self {
            catalog,
            stock,
            slot,
            writer: Mutex::new(()),
            state,
            notifications,
        })
    }

    /// The last committed cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.state.borrow().clone()
    }

    /// Receive every committed cart from now on.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.state.subscribe()
    }

    /// Receive every failure notification from now on.
    #[must_use]
    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Put one more unit of a product in the cart.
    ///
    /// A product already in the cart goes through [`Self::set_quantity`] with
    /// its amount plus one, and failures are reported as quantity changes.
    /// Otherwise the product is looked up in the catalog and appended with an
    /// amount of 1.
    ///
    /// # Errors
    ///
    /// Returns the notification that was emitted if the cart was left unchanged.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn add_product(&self, id: ProductId) -> Result<Cart, Notification> {
        let _writer = self.writer.lock().await;
        let current = self.cart();

        if let Some(item) = current.get(id) {
            let amount = item.amount.saturating_add(1);
            let result = self.with_checked_amount(&current, id, amount).await;
            return self.finish(CartOperation::UpdateQuantity, result).await;
        }

        let result = self.with_catalog_product(&current, id).await;
        self.finish(CartOperation::AddProduct, result).await
    }

    /// Drop a product from the cart.
    ///
    /// # Errors
    ///
    /// Returns the notification that was emitted if the product wasn't in the cart.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn remove_product(&self, id: ProductId) -> Result<Cart, Notification> {
        let _writer = self.writer.lock().await;
        let current = self.cart();

        let result = current.without(id).map_err(CartError::from);
        self.finish(CartOperation::RemoveProduct, result).await
    }

    /// Set the amount of a product already in the cart, within its stock.
    ///
    /// # Errors
    ///
    /// Returns the notification that was emitted if the product isn't in the
    /// cart, the stock lookup failed, or the stock doesn't cover `amount`.
    #[instrument(skip(self), fields(product_id = %id, amount = amount.get()))]
    pub async fn set_quantity(
        &self,
        id: ProductId,
        amount: NonZeroU32,
    ) -> Result<Cart, Notification> {
        let _writer = self.writer.lock().await;
        let current = self.cart();

        let result = self.with_checked_amount(&current, id, amount).await;
        self.finish(CartOperation::UpdateQuantity, result).await
    }

    /// Log `error` and emit the notification for it.
    ///
    /// Views use this for requests they reject before reaching the store, so
    /// the user still gets exactly one notification.
    pub fn report(&self, operation: CartOperation, error: &CartError) -> Notification {
        warn!(operation = ?operation, error = %error, "Cart operation rejected");

        let notification = Notification::for_failure(operation, error);
        // No subscribers is fine; the caller still gets the notification.
        let _ = self.notifications.send(notification.clone());
        notification
    }

    async fn with_catalog_product(&self, current: &Cart, id: ProductId) -> Result<Cart, CartError> {
        let product = self
            .catalog
            .product(id)
            .await?
            .ok_or(CartError::ProductNotFound(id))?;

        Ok(current.with_product(&product)?)
    }

    async fn with_checked_amount(
        &self,
        current: &Cart,
        id: ProductId,
        amount: NonZeroU32,
    ) -> Result<Cart, CartError> {
        if !current.contains(id) {
            return Err(CartError::ItemNotInCart(id));
        }

        let stock = self
            .stock
            .stock(id)
            .await?
            .ok_or(CartError::StockUnknown(id))?;

        if !stock.covers(amount) {
            return Err(CartError::StockExceeded {
                id,
                requested: amount.get(),
                available: stock.amount,
            });
        }

        Ok(current.with_amount(id, amount)?)
    }

    /// Persist and publish `result`, or report why there is nothing to commit.
    async fn finish(
        &self,
        operation: CartOperation,
        result: Result<Cart, CartError>,
    ) -> Result<Cart, Notification> {
        match result {
            Ok(next) => match self.commit(next).await {
                Ok(cart) => {
                    info!(
                        operation = ?operation,
                        items = cart.len(),
                        units = cart.item_count(),
                        "Cart updated"
                    );
                    Ok(cart)
                }
                Err(e) => Err(self.report(operation, &e)),
            },
            Err(e) => Err(self.report(operation, &e)),
        }
    }

    /// Write the snapshot first; only a persisted cart becomes visible.
    async fn commit(&self, next: Cart) -> Result<Cart, CartError> {
        let json = CartSnapshot::capture(&next).to_json()?;
        self.slot.write(&json).await?;
        self.state.send_replace(next.clone());
        Ok(next)
    }
}
