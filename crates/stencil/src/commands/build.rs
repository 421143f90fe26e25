//! Site build command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use stencil_static::SiteBuilder;

use crate::config::load_config;

/// Run the build command.
pub async fn run(config_path: &Path, output_dir: Option<PathBuf>) -> Result<()> {
    tracing::info!("Building pages...");

    let file_config = load_config(config_path)?;
    if file_config.pages.is_empty() {
        tracing::warn!("No pages configured in {}", config_path.display());
    }

    let mut config = file_config.into_build_config(config_path);
    if output_dir.is_some() {
        config.output_dir = output_dir;
    }

    let result = SiteBuilder::new(config).build().context("Build failed")?;

    tracing::info!("Built {} pages in {}ms", result.pages, result.duration_ms);

    Ok(())
}
