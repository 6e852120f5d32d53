pub mod cli;
pub mod config;
pub mod error;
pub mod render;
pub mod response;
pub mod scheduler;
pub mod session;
pub mod storage;
