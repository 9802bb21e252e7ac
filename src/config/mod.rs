pub mod cache;
pub mod credentials;
pub mod identity;
pub mod proc_loader;
pub mod proc_validator;
pub mod service;
pub mod settings;
pub mod store;
