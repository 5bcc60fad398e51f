pub mod product_dto;
pub mod user_dto;
