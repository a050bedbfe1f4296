pub mod admin_cli;
pub mod auth;
pub mod database;
pub mod environment;
pub mod export;
pub mod listings;
pub mod stats;
pub mod web;

pub use web::start_web_server;

/// Leveled logging shorthand used throughout the handlers.
#[macro_export]
macro_rules! app_log {
    (trace, $($arg:tt)*) => { tracing::trace!($($arg)*) };
    (debug, $($arg:tt)*) => { tracing::debug!($($arg)*) };
    (info, $($arg:tt)*) => { tracing::info!($($arg)*) };
    (warn, $($arg:tt)*) => { tracing::warn!($($arg)*) };
    (error, $($arg:tt)*) => { tracing::error!($($arg)*) };
}
