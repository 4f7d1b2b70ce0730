pub mod auth;
pub mod panic;
pub mod request_id;
