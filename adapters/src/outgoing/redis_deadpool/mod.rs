pub mod balance_store_redis;
