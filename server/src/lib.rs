pub mod bootstrap;
pub mod command;
pub mod config_loader;
pub mod observability;
