//! Preview server command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use stencil_server::{serve_dir, socket_addr};

use crate::config::load_config;

/// Run the serve command.
pub async fn run(
    config_path: &Path,
    port: u16,
    dir: Option<PathBuf>,
    open_browser: bool,
) -> Result<()> {
    let dir = preview_dir(config_path, dir)?;
    let addr = socket_addr("127.0.0.1", port)?;

    serve_dir(&dir, addr, open_browser).await?;

    Ok(())
}

/// Directory to preview: the `--dir` argument, else the site's output
/// directory from the config file. It must already hold a build.
fn preview_dir(config_path: &Path, dir: Option<PathBuf>) -> Result<PathBuf> {
    let dir = match dir {
        Some(dir) => dir,
        None => load_config(config_path)?.serve_dir(config_path),
    };

    if !dir.is_dir() {
        anyhow::bail!(
            "Directory not found: {}. Run 'stencil build' first.",
            dir.display()
        );
    }

    Ok(dir)
}
