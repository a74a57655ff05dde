//! Domain models for KitchenCommand

mod item;
mod order;
mod recipe;
mod transaction;

pub use item::*;
pub use order::*;
pub use recipe::*;
pub use transaction::*;
