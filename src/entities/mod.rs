pub mod inventory_item;
pub mod inventory_transaction;
pub mod supplier;
pub mod user;
