//! The cart and its pure state transitions.
//!
//! Every transition borrows the current cart and returns a new one, so the
//! caller decides when (and whether) the new state becomes visible.

use core::num::NonZeroU32;
use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Product, ProductId};

/// Errors from cart transitions that would break the cart's invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CartStateError {
    /// The product already has a line in the cart.
    #[error("product {0} is already in the cart")]
    DuplicateItem(ProductId),
    /// The product has no line in the cart.
    #[error("product {0} is not in the cart")]
    ItemNotInCart(ProductId),
    /// The product's price is below zero.
    #[error("product {0} has a negative price")]
    NegativePrice(ProductId),
}

/// One product line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub image: String,
    /// Never zero; dropping a line is an explicit removal.
    pub amount: NonZeroU32,
}

impl CartItem {
    /// A fresh line for `product` holding a single unit.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            price: product.price,
            image: product.image.clone(),
            amount: NonZeroU32::MIN,
        }
    }

    /// Unit price times amount.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.amount.get())
    }
}

/// The user's current selection, unique by product id, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Append a single unit of `product`.
    ///
    /// # Errors
    ///
    /// Returns [`CartStateError::DuplicateItem`] if the product already has a
    /// line, or [`CartStateError::NegativePrice`] if its price is below zero.
    pub fn with_product(&self, product: &Product) -> Result<Self, CartStateError> {
        if self.contains(product.id) {
            return Err(CartStateError::DuplicateItem(product.id));
        }
        if product.price < Decimal::ZERO {
            return Err(CartStateError::NegativePrice(product.id));
        }

        let mut items = self.items.clone();
        items.push(CartItem::from_product(product));
        Ok(Self { items })
    }

    /// Rewrite the amount of one line in place, leaving every other line as is.
    ///
    /// # Errors
    ///
    /// Returns [`CartStateError::ItemNotInCart`] if the product has no line.
    pub fn with_amount(&self, id: ProductId, amount: NonZeroU32) -> Result<Self, CartStateError> {
        if !self.contains(id) {
            return Err(CartStateError::ItemNotInCart(id));
        }

        let items = self
            .items
            .iter()
            .map(|item| {
                if item.id == id {
                    CartItem {
                        amount,
                        ..item.clone()
                    }
                } else {
                    item.clone()
                }
            })
            .collect();
        Ok(Self { items })
    }

    /// Drop the line for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CartStateError::ItemNotInCart`] if the product has no line.
    pub fn without(&self, id: ProductId) -> Result<Self, CartStateError> {
        if !self.contains(id) {
            return Err(CartStateError::ItemNotInCart(id));
        }

        let items = self
            .items
            .iter()
            .filter(|item| item.id != id)
            .cloned()
            .collect();
        Ok(Self { items })
    }

    /// Total units across all lines (the cart badge).
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.amount.get()))
            .sum()
    }

    /// Amount per product, for marking listing entries that are already in the cart.
    #[must_use]
    pub fn amounts(&self) -> HashMap<ProductId, u32> {
        self.items
            .iter()
            .map(|item| (item.id, item.amount.get()))
            .collect()
    }

    /// Sum of all line subtotals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::subtotal).sum()
    }
}

impl TryFrom<Vec<CartItem>> for Cart {
    type Error = CartStateError;

    fn try_from(items: Vec<CartItem>) -> Result<Self, Self::Error> {
        for (index, item) in items.iter().enumerate() {
            if items.iter().skip(index + 1).any(|other| other.id == item.id) {
                return Err(CartStateError::DuplicateItem(item.id));
            }
        }
        Ok(Self { items })
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}
