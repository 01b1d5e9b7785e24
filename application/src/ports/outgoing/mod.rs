pub mod key_value_store;
pub mod retry_delay;
