// handlers/protected/auth/mod.rs - Authenticated account endpoints

pub mod whoami;

pub use whoami::whoami_get;
