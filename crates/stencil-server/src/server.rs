//! Development server implementation.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use tower_http::services::ServeDir;

use tokio::sync::mpsc;

use stencil_static::{BuildConfig, SiteBuilder};

use crate::watcher::{FileWatcher, WatchEvent};

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Site to build
    pub build: BuildConfig,

    /// Directory served over HTTP
    pub serve_dir: PathBuf,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            build: BuildConfig::default(),
            serve_dir: PathBuf::from("dist"),
            port: 7777,
            host: "127.0.0.1".to_string(),
            open: true,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("File watch error: {0}")]
    WatchError(String),
}

/// Development server.
pub struct DevServer {
    config: DevServerConfig,
}

impl DevServer {
    /// Create a new development server.
    pub fn new(config: DevServerConfig) -> Self {
        Self { config }
    }

    /// Build, then watch and serve until the server stops.
    pub async fn start(self) -> Result<(), ServerError> {
        let addr = socket_addr(&self.config.host, self.config.port)?;

        let builder = Arc::new(SiteBuilder::new(self.config.build.clone()));
        rebuild(&builder).await;

        // Paths the builder writes to must not trigger rebuilds
        let mut outputs: Vec<PathBuf> = builder.output_dirs().into_iter().collect();
        outputs.push(self.config.serve_dir.clone());
        let ignored = IgnoredDirs::new(outputs);

        let (watcher, rx) = FileWatcher::new(&[self.config.build.root.clone()])
            .map_err(|e| ServerError::WatchError(e.to_string()))?;

        tokio::spawn(async move {
            watch_loop(&builder, rx, &ignored).await;
            // Keep watcher alive
            drop(watcher);
        });

        serve_dir(&self.config.serve_dir, addr, self.config.open).await
    }
}

/// Parse a host and port into a socket address.
pub fn socket_addr(host: &str, port: u16) -> Result<SocketAddr, ServerError> {
    let addr = format!("{}:{}", host, port);
    addr.parse().map_err(|_| ServerError::InvalidAddress(addr.clone()))
}

/// Serve a directory of built pages until the server stops.
pub async fn serve_dir(
    dir: &Path,
    addr: SocketAddr,
    open_browser: bool,
) -> Result<(), ServerError> {
    let app = Router::new().fallback_service(ServeDir::new(dir));

    tracing::info!("Serving {} at http://{}", dir.display(), addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

    if open_browser {
        let url = format!("http://{}", addr);
        let _ = open::that(&url);
    }

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

    Ok(())
}

/// Outcome counts of a watch loop.
#[derive(Debug, Default, PartialEq, Eq)]
struct RebuildStats {
    builds: usize,
    failures: usize,
}

/// Rebuild once per batch of changes until the watcher channel closes.
///
/// A failed rebuild is logged and the loop keeps waiting for the next batch.
async fn watch_loop(
    builder: &Arc<SiteBuilder>,
    mut rx: mpsc::Receiver<Vec<WatchEvent>>,
    ignored: &IgnoredDirs,
) -> RebuildStats {
    let mut stats = RebuildStats::default();

    while let Some(batch) = rx.recv().await {
        let batch: Vec<WatchEvent> = batch
            .into_iter()
            .filter(|event| !ignored.contains(event.path()))
            .collect();
        if batch.is_empty() {
            continue;
        }

        stats.builds += 1;
        if !handle_watch_batch(builder, &batch).await {
            stats.failures += 1;
        }
    }

    stats
}

/// Log a batch of changes and rebuild the site once for all of them.
async fn handle_watch_batch(builder: &Arc<SiteBuilder>, batch: &[WatchEvent]) -> bool {
    for event in batch {
        match event {
            WatchEvent::TemplateModified(path) => {
                tracing::info!("Template modified: {}", path.display());
            }
            WatchEvent::ScriptModified(path) => {
                tracing::info!("Script modified: {}", path.display());
            }
            WatchEvent::Created(path) | WatchEvent::Deleted(path) | WatchEvent::Modified(path) => {
                tracing::debug!("Changed: {}", path.display());
            }
        }
    }

    rebuild(builder).await
}

/// Rebuild the whole site on a blocking thread. Failures are logged and the
/// previous output stays in place.
async fn rebuild(builder: &Arc<SiteBuilder>) -> bool {
    let builder = Arc::clone(builder);

    match tokio::task::spawn_blocking(move || builder.build()).await {
        Ok(Ok(result)) => {
            tracing::info!("Built {} pages in {}ms", result.pages, result.duration_ms);
            true
        }
        Ok(Err(e)) => {
            tracing::error!("Build failed: {}", e);
            false
        }
        Err(e) => {
            tracing::error!("Build task panicked: {}", e);
            false
        }
    }
}

/// Output directories whose changes are ignored.
///
/// Each directory is kept both as given (made absolute) and canonicalized,
/// since a deleted file can no longer be canonicalized and the watcher
/// reports paths in the form the root was given in.
#[derive(Debug)]
struct IgnoredDirs {
    dirs: Vec<PathBuf>,
}

impl IgnoredDirs {
    fn new(dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut forms = Vec::new();
        for dir in dirs {
            let raw = absolute(&dir);
            let canonical = canonical(&dir);
            if canonical != raw {
                forms.push(canonical);
            }
            forms.push(raw);
        }
        Self { dirs: forms }
    }

    fn contains(&self, path: &Path) -> bool {
        let raw = absolute(path);
        let canonical = canonical(path);
        self.dirs
            .iter()
            .any(|dir| raw.starts_with(dir) || canonical.starts_with(dir))
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Canonical form of a path. A missing file is resolved through its parent
/// directory.
fn canonical(path: &Path) -> PathBuf {
    if let Ok(resolved) = std::fs::canonicalize(path) {
        return resolved;
    }

    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => std::fs::canonicalize(parent)
            .map(|parent| parent.join(name))
            .unwrap_or_else(|_| absolute(path)),
        _ => absolute(path),
    }
}
