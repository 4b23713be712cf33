#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

use std::future::Future;
use std::pin::Pin;

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod persistence;
pub mod session;
pub mod transport;
pub mod ui;

/// Boxed future returned by the object-safe async traits in this crate.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub use config::Config;
pub use error::RiddleError;
pub use session::{SessionController, SessionStore, TurnOutcome};
