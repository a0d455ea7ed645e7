pub mod application;
pub mod commands;
pub mod error;
pub mod http;
pub mod manifest;
pub mod provider;
pub mod runtime;
pub mod stub;
