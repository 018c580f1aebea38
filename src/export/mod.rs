pub mod lab_csv;
pub mod models;
pub mod services;
