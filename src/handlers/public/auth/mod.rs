// handlers/public/auth/mod.rs - Token acquisition endpoints

pub mod login;
pub mod register;

pub use login::{login_patient_post, login_professional_post};
pub use register::register_post;
