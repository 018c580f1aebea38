pub mod analysis;
pub mod defaults;
pub mod models;
pub mod validation;
