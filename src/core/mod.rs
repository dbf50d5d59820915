pub mod actions;
pub mod config;
pub mod controller;
pub mod conversation;
pub mod message;
pub mod models;
pub mod session;
pub mod store;
