pub mod auction;
pub mod auth;
pub mod bidding;
pub mod broadcast;
pub mod database;
pub mod error;
pub mod handlers;
pub mod scheduler;
pub mod store;
