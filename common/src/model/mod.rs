//! Domain models shared across services

pub mod account;
pub mod transaction;
pub mod audit;
pub mod user;
