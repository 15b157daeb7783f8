#![allow(clippy::uninlined_format_args)]

pub mod config;
pub mod error;
pub mod fetch;
pub mod format;
pub mod hackernews;
pub mod lobsters;
pub mod model;
pub mod provider;
pub mod reconcile;
pub mod render;
mod scrape;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{Error, Result};
pub use model::{count_all, Comment, Source, Thread};
pub use provider::{ItemId, Provider, Registry};
pub use reconcile::{reconcile, reconcile_thread, CommentLayout};
pub use render::{RenderOptions, Renderer};
