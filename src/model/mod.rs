pub mod user;
pub mod session;
pub mod product;
