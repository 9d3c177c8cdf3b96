pub mod settings;
pub mod service;
pub mod proc_initiateor;
pub mod proc_loader;
pub mod proc_validator;
