pub mod retry;
pub mod service;
pub mod transaction;
