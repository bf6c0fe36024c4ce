pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod image_processing;
pub mod intake;
pub mod mock_backend;
pub mod models;
pub mod studio;
pub mod web_pages;
