//! HTTP surface: request/response models, error translation, route
//! wiring, and server setup.

pub mod error;
pub mod models;
pub mod routes;
pub mod server;

pub use server::ApiServer;
