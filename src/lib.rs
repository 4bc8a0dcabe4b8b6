pub mod auth;
pub mod blacklist;
pub mod cli;
pub mod config;
pub mod context;
pub mod inspect;
pub mod keyinfo;
pub mod logging;
pub mod registry;
pub mod report;
pub mod server;
pub mod ssh;
