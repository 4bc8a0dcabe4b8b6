pub mod handler;
pub mod keys;
pub mod presenter;
pub mod session;
