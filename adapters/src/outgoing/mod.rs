pub mod in_memory;
pub mod redis_deadpool;
pub mod tokio_time;
