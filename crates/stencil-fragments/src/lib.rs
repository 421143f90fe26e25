//! Fragment include resolver for stencil pages.
//!
//! Expands `{{> path }}` include markers by splicing in the referenced
//! fragment files, recursively, with a per-render cache so every distinct
//! fragment is read and expanded at most once.

pub mod marker;
pub mod resolver;
pub mod source;

pub use marker::{find_include, IncludeMarker};
pub use resolver::{FragmentResolver, ResolveError};
pub use source::{FragmentSource, FsSource};
