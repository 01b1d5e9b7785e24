pub mod account;
pub mod balance;
pub mod charge;
pub mod error;
