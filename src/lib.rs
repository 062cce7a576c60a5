pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod paginate;
pub mod quiz;
pub mod search;
pub mod seed;
pub mod server;
pub mod store;
