// ABOUTME: Library crate for the project session controller exposing public API for testing and external use

pub mod app;
pub mod config;
pub mod ipc;
pub mod models;
pub mod session;
