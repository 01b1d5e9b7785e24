pub mod balance_store_memory;
