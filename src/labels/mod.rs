pub mod render;
pub mod summary;
