//! Static page assembly for stencil.
//!
//! Expands variant head and body fragments, substitutes them together with a
//! title and a pre-built script into a base template, and writes the page.

pub mod builder;
pub mod page;
pub mod template;

pub use builder::{BuildConfig, BuildError, BuildResult, PageConfig, SiteBuilder};
pub use page::{compose_page, render_page, PageSpec, RenderedPage};
pub use template::{PageParts, PageTemplate, TemplateError};
