pub mod aggregation;
pub mod api;
pub mod auth_client;
pub mod config;
pub mod db;
pub mod display;
pub mod error;
pub mod export;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod service;
pub mod session;
pub mod store;
pub mod validators;
