//! # vault-server
//!
//! HTTP/JSON surface for the secret vault: account bootstrap, the access
//! gate, and create/get/delete/change routes for every secret category.

mod error;
pub mod gate;
pub mod routes;
mod server;
mod state;

pub use error::ApiError;
pub use gate::{access_gate, Identity};
pub use routes::router;
pub use server::VaultServer;
pub use state::{AppState, VaultFor};
