//! A database connected web application: HTTP CRUD for the users resource,
//! cookie-session login, static asset serving, and a developer CLI.

pub mod case;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod store;
pub mod web;

pub use config::{AppConfig, BuildInfo};
pub use db::Db;
pub use error::AppError;
pub use store::UserStore;
pub use web::{build_router, AppState};
