//! HTTP handlers for the KitchenCommand inventory platform

pub mod admin;
pub mod deduction;
pub mod engine;
pub mod health;
pub mod items;
pub mod ledger;
pub mod orders;
pub mod reorder;

pub use admin::*;
pub use deduction::*;
pub use engine::*;
pub use health::*;
pub use items::*;
pub use ledger::*;
pub use orders::*;
pub use reorder::*;
