/// DigitalOcean API client implementation
pub mod api;
pub mod client;
pub mod models;
pub mod token;

pub use api::DigitalOceanApi;
pub use client::DigitalOceanClient;
pub use token::TokenSource;
