//! Infrastructure adapters for pawlist.
//!
//! - [`InMemorySessionProvider`]: local authentication backend
//! - [`InMemoryDataStore`] / [`FileDataStore`]: owner-scoped record stores
//! - [`ConfigService`]: cached `config.toml` loading
//! - [`init_tracing`]: fmt subscriber setup

pub mod config_service;
pub mod file_data_store;
pub mod memory_data_store;
pub mod memory_session_provider;
pub mod paths;
pub mod storage;
pub mod telemetry;

pub use config_service::ConfigService;
pub use file_data_store::FileDataStore;
pub use memory_data_store::InMemoryDataStore;
pub use memory_session_provider::InMemorySessionProvider;
pub use paths::PawlistPaths;
pub use telemetry::init_tracing;
