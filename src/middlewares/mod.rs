pub mod admin_middleware;
pub mod session_middleware;
