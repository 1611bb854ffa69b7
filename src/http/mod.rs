//! HTTP surface: health check and the bridge upgrade route

pub mod routes;

pub use routes::build_router;
