pub mod cookies;
pub mod error;
pub mod google_oauth;
pub mod logger;
pub mod upload;
