//! The cart store and its collaborators.
//!
//! [`CartStore`] is the single source of truth for the cart. It looks products
//! up through a [`Catalog`], checks amounts against a [`StockLedger`] and
//! writes every committed cart through to a [`SnapshotSlot`]. Views read the
//! committed cart, subscribe to changes and receive one [`Notification`] per
//! failed operation.

mod error;
mod notification;
mod services;
mod storage;
mod store;

pub use error::CartError;
pub use notification::{CartOperation, Notification};
pub use services::{Catalog, StockLedger};
pub use storage::{FileSlot, MemorySlot, SnapshotSlot, StorageError};
pub use store::CartStore;
