pub mod attribute;
pub mod recipe;
pub mod user;
