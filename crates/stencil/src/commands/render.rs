//! Single page render command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use stencil_static::{render_page, PageSpec};

/// Arguments for rendering one page.
#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Root directory fragments and the template are resolved against
    #[arg(long)]
    pub root: PathBuf,

    /// Base template path (relative to root)
    #[arg(long)]
    pub template: PathBuf,

    /// Head fragment path (relative to root)
    #[arg(long, default_value = "")]
    pub head: String,

    /// Body fragment path (relative to root)
    #[arg(long, default_value = "")]
    pub body: String,

    /// Bundled script file
    #[arg(long)]
    pub script: PathBuf,

    /// Document title
    #[arg(long)]
    pub title: String,

    /// Destination HTML file
    #[arg(long)]
    pub output: PathBuf,
}

impl From<RenderArgs> for PageSpec {
    fn from(args: RenderArgs) -> Self {
        Self {
            template: args.template,
            head: args.head,
            body: args.body,
            script: args.script,
            title: args.title,
            output: args.output,
        }
    }
}

/// Run the render command.
pub async fn run(args: RenderArgs) -> Result<()> {
    let root = args.root.clone();
    let spec = PageSpec::from(args);

    let page = render_page(&root, &spec)
        .with_context(|| format!("Failed to render {}", spec.output.display()))?;

    tracing::info!("Rendered {} ({} bytes)", page.output.display(), page.bytes);

    Ok(())
}
