pub mod api;
pub mod args;
pub mod commands;
mod config;
pub mod dashboard;
mod error;
pub mod model;
mod utils;


pub use api::Mode;
pub use config::{Backend, Config, Credentials, InitOptions};
pub use error::Error;
pub use error::Result;
pub use model::Amount;
