mod circuit_manager;
mod manager_config;

pub use circuit_manager::CircuitManager;
pub use manager_config::ManagerConfig;
