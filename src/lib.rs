//! Wrapped: a small Spotify listening dashboard.
//!
//! This library provides a web application that signs a user in with Spotify
//! using the OAuth2 authorization-code flow, keeps the resulting token in a
//! server-side session and renders a few read-only views of the user's
//! listening data as HTML.
//!
//! # Modules
//!
//! - `api` - HTTP route handlers (dashboard, callback, data views, logout)
//! - `config` - Configuration management and environment variables
//! - `error` - Error types for configuration, OAuth and Web API failures
//! - `oauth` - Authorization URL building, code exchange and token refresh
//! - `render` - HTML rendering for every page the server returns
//! - `server` - Router construction and the HTTP listener
//! - `session` - Server-side, cookie-keyed session store
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use wrapped::{config, server};
//!
//! #[tokio::main]
//! async fn main() -> wrapped::Res<()> {
//!     config::load_env().await?;
//!     let config = config::Config::from_env()?;
//!     server::start_api_server(config, false).await
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod oauth;
pub mod render;
pub mod server;
pub mod session;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Used on the startup path where any failure simply ends the program. Request
/// handling uses the typed errors from [`error`] instead.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Listening on {}", addr);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// # Behavior
///
/// This macro will cause the program to exit immediately after printing
/// the error message. It is only used while the server is starting up;
/// request handlers never call it.
///
/// # Example
///
/// ```
/// error!("Cannot load configuration. Err: {}", e);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable issues, e.g. a failed token exchange or a Web API call
/// that ends up on an error page.
///
/// # Example
///
/// ```
/// warning!("Token exchange failed: {}", e);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
