//! One-shot messages reporting why a cart operation did not go through.

use serde::Serialize;

use super::CartError;

/// The view-facing cart operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CartOperation {
    AddProduct,
    RemoveProduct,
    UpdateQuantity,
}

/// A user-visible failure message.
///
/// Views only learn *that* an operation failed; the underlying [`CartError`]
/// is logged by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub operation: CartOperation,
    pub message: &'static str,
}

impl Notification {
    pub const ADD_FAILED: &'static str = "Error adding product";
    pub const REMOVE_FAILED: &'static str = "Error removing product";
    pub const OUT_OF_STOCK: &'static str = "Requested quantity is out of stock";
    pub const UPDATE_FAILED: &'static str = "Error changing product quantity";

    /// The message shown for `error` raised while performing `operation`.
    #[must_use]
    pub fn for_failure(operation: CartOperation, error: &CartError) -> Self {
        let message = match (operation, error) {
            (CartOperation::UpdateQuantity, CartError::StockExceeded { .. }) => Self::OUT_OF_STOCK,
            (CartOperation::UpdateQuantity, _) => Self::UPDATE_FAILED,
            (CartOperation::AddProduct, _) => Self::ADD_FAILED,
            (CartOperation::RemoveProduct, _) => Self::REMOVE_FAILED,
        };
        Self { operation, message }
    }
}

#[cfg(test)]
mod tests {
    use rocketshoes_core::ProductId;

    use super::*;

    #[test]
    fn test_stock_exceeded_has_its_own_message() {
        let err = CartError::StockExceeded {
            id: ProductId::new(1),
            requested: 2,
            available: 1,
        };
        let n = Notification::for_failure(CartOperation::UpdateQuantity, &err);
        assert_eq!(n.message, Notification::OUT_OF_STOCK);
    }

    #[test]
    fn test_other_causes_collapse_per_operation() {
        let missing = CartError::ProductNotFound(ProductId::new(1));
        assert_eq!(
            Notification::for_failure(CartOperation::AddProduct, &missing).message,
            Notification::ADD_FAILED
        );
        assert_eq!(
            Notification::for_failure(CartOperation::UpdateQuantity, &CartError::ZeroAmount)
                .message,
            Notification::UPDATE_FAILED
        );
        let absent = CartError::ItemNotInCart(ProductId::new(99));
        assert_eq!(
            Notification::for_failure(CartOperation::RemoveProduct, &absent).message,
            Notification::REMOVE_FAILED
        );
    }

    #[test]
    fn test_serializes_for_event_stream() {
        let n = Notification::for_failure(CartOperation::RemoveProduct, &CartError::ZeroAmount);
        let json = serde_json::to_string(&n).unwrap_or_default();
        assert_eq!(
            json,
            r#"{"operation":"remove_product","message":"Error removing product"}"#
        );
    }
}
