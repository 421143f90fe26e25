//! Development server for stencil sites.
//!
//! Builds the site, watches the source tree, rebuilds on every change and
//! serves the output directory.

pub mod server;
pub mod watcher;

pub use server::{serve_dir, socket_addr, DevServer, DevServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchEvent};
