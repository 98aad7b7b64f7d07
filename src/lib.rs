#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod normalize;
pub mod prompt;
pub mod providers;
pub mod transport;

pub use config::Config;
pub use dispatch::{DispatchRouter, Dispatcher};
pub use error::{MailcraftError, Result};
pub use normalize::{NormalizedOutput, normalize};
pub use transport::{CorrelationChannel, LocalHost, Request, Response, TransportStrategy};
