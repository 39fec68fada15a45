pub mod auth;
pub mod health;
pub mod jobs;
pub mod predictions;
pub mod prices;
pub mod settings;
pub mod stats;
pub mod tickers;
