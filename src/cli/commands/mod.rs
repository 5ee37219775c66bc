pub mod build;
pub mod live;
pub mod validate;
