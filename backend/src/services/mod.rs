//! Business logic services for the KitchenCommand inventory platform

pub mod admin;
pub mod deduction;
pub mod engine;
pub mod items;
pub mod ledger;
pub mod orders;
pub mod reorder;

pub use admin::AdminService;
pub use deduction::DeductionService;
pub use engine::{EngineService, ItemLocks};
pub use items::ItemService;
pub use ledger::LedgerService;
pub use orders::OrderService;
pub use reorder::ReorderService;
