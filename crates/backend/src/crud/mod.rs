pub mod connection;
pub mod error;
pub mod handlers;
pub mod repository;
pub mod values;

pub use connection::AppState;
