pub mod cli;
pub mod config;
pub mod core;
pub mod crypto;
pub mod ds;
pub mod identity;
pub mod message;
pub mod storage;
