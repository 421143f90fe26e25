//! Configuration file (stencil.toml).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use stencil_static::{BuildConfig, PageConfig};

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub site: SiteConfig,

    /// Template presets by name
    #[serde(default)]
    pub templates: HashMap<String, PathBuf>,

    #[serde(default)]
    pub pages: Vec<PageEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SiteConfig {
    /// Root directory, relative to the config file
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Title for pages that do not set one
    #[serde(default = "default_title")]
    pub title: String,

    /// Directory served by `dev` and `serve`, relative to the root
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            title: default_title(),
            output: default_output(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PageEntry {
    pub slug: String,
    pub title: Option<String>,
    pub template: String,
    pub head: Option<String>,
    pub body: Option<String>,
    pub script: PathBuf,
    pub output: PathBuf,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_title() -> String {
    "Untitled".to_string()
}
fn default_output() -> PathBuf {
    PathBuf::from("dist")
}

impl ConfigFile {
    /// Root directory with a relative `site.root` anchored at the config
    /// file's directory.
    pub fn root(&self, config_path: &Path) -> PathBuf {
        match config_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(&self.site.root),
            _ => self.site.root.clone(),
        }
    }

    /// Directory the dev and preview servers serve.
    pub fn serve_dir(&self, config_path: &Path) -> PathBuf {
        self.root(config_path).join(&self.site.output)
    }

    /// Convert into builder configuration.
    pub fn into_build_config(self, config_path: &Path) -> BuildConfig {
        let root = self.root(config_path);

        BuildConfig {
            root,
            title: self.site.title,
            presets: self.templates,
            pages: self
                .pages
                .into_iter()
                .map(|entry| PageConfig {
                    slug: entry.slug,
                    title: entry.title,
                    template: entry.template,
                    head: entry.head,
                    body: entry.body,
                    script: entry.script,
                    output: entry.output,
                })
                .collect(),
            output_dir: None,
        }
    }
}

/// Load configuration if the file exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        return Ok(config);
    }
    Ok(ConfigFile::default())
}
