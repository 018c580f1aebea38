pub mod cache;
pub mod models;
pub mod selection;
pub mod services;

#[cfg(test)]
mod tests;
