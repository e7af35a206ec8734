pub mod commands;
pub mod config;
pub mod error;
pub mod gateway;
pub mod publisher;
pub mod reconciler;
pub mod roles;
