pub mod app;
pub mod auth;
pub mod completions;
pub mod config;
pub mod db;
pub mod error;
pub mod goals;
pub mod habits;
pub mod mailer;
pub mod state;
