pub mod analytics;
pub mod config;
pub mod error;
pub mod form;
pub mod location;
pub mod pipeline;
pub mod webhook;
