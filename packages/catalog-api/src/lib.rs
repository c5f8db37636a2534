//! REST API for the data file catalog.
//!
//! Exposes data files, their fields and valid values over HTTP. Every
//! mutation is delegated to [`catalog_core::Catalog`]; this crate only
//! handles routing, request decoding and the response envelope.

pub mod handlers;
pub mod router;
pub mod server;

pub use router::{AppState, Router, RouterError};
pub use server::Server;
