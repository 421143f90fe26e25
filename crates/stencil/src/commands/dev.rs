//! Development server command.

use std::path::Path;

use anyhow::Result;
use stencil_server::{DevServer, DevServerConfig};

use crate::config::load_config;

/// Run the dev server.
pub async fn run(config_path: &Path, port: u16, open: bool) -> Result<()> {
    tracing::info!("Starting development server on port {}", port);

    let file_config = load_config(config_path)?;
    let serve_dir = file_config.serve_dir(config_path);

    let config = DevServerConfig {
        build: file_config.into_build_config(config_path),
        serve_dir,
        port,
        open,
        ..Default::default()
    };

    DevServer::new(config).start().await?;

    Ok(())
}
