#[cfg(any(feature = "adapters", feature = "deadpool-redis", feature = "tokio"))]
compile_error!("application must not depend on adapters/framework crates");

pub mod billing;
pub mod config;
pub mod error;
pub mod infrastructure_config;
pub mod ports;
