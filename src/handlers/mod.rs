// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth, /auth/* and service probes) → Protected (JWT auth, /api/*)

pub mod extract;
pub mod protected;
pub mod public;

pub use extract::ApiJson;
