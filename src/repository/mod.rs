pub mod repository_error;
pub mod mongo;
pub mod user_repo;
pub mod session_repo;
pub mod product_repo;
pub mod memory;
