// handlers/public/mod.rs - Public handlers (no authentication)
//
// Service probes and token acquisition. Everything under /api requires a JWT.

pub mod auth;
pub mod root;

pub use root::{health, root};
