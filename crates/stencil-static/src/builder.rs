//! Site builder.

use std::collections::{BTreeSet, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;

use stencil_fragments::ResolveError;

use crate::page::{render_page, PageSpec};
use crate::template;

/// One page entry of a site.
#[derive(Debug, Clone)]
pub struct PageConfig {
    /// Short identifier used in logs
    pub slug: String,

    /// Document title (defaults to the site title)
    pub title: Option<String>,

    /// Template preset name, or a template path relative to the root
    pub template: String,

    /// Head entry document, relative to the root
    pub head: Option<String>,

    /// Body entry document, relative to the root
    pub body: Option<String>,

    /// Pre-built script, relative to the root
    pub script: PathBuf,

    /// Output file, relative to the root
    pub output: PathBuf,
}

/// Configuration for building a site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Directory all page paths are resolved against
    pub root: PathBuf,

    /// Title for pages that do not set one
    pub title: String,

    /// Named base templates
    pub presets: HashMap<String, PathBuf>,

    /// Pages to build
    pub pages: Vec<PageConfig>,

    /// Write every page into this directory instead of its configured location
    pub output_dir: Option<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            title: "Untitled".to_string(),
            presets: HashMap::new(),
            pages: vec![],
            output_dir: None,
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of pages generated
    pub pages: usize,

    /// Written files, in page order
    pub outputs: Vec<PathBuf>,

    /// Total build time in milliseconds
    pub duration_ms: u64,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Failed to read {}: {source}", .path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid template {}: {source}", .path.display())]
    TemplateError {
        path: PathBuf,
        #[source]
        source: template::TemplateError,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unknown template preset \"{preset}\" for page {page}")]
    UnknownPreset { page: String, preset: String },
}

/// Static site builder.
pub struct SiteBuilder {
    config: BuildConfig,
}

impl SiteBuilder {
    /// Create a new site builder.
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    /// The configuration this builder was created with.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build every page.
    ///
    /// Pages render in parallel, each with its own fragment cache. The first
    /// failing page (in page order) is returned as the error.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        let results: Vec<Result<PathBuf, BuildError>> = self
            .config
            .pages
            .par_iter()
            .map(|page| self.build_page(page))
            .collect();

        let mut outputs = Vec::with_capacity(results.len());
        for result in results {
            outputs.push(result?);
        }

        Ok(BuildResult {
            pages: outputs.len(),
            outputs,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Directories pages are written into.
    pub fn output_dirs(&self) -> BTreeSet<PathBuf> {
        self.config
            .pages
            .iter()
            .filter_map(|page| self.output_path(page).parent().map(Path::to_path_buf))
            .collect()
    }

    /// Build a single page.
    fn build_page(&self, page: &PageConfig) -> Result<PathBuf, BuildError> {
        let spec = self.page_spec(page)?;
        let rendered = render_page(&self.config.root, &spec)?;

        tracing::info!("Built {} -> {}", page.slug, rendered.output.display());
        tracing::debug!("{}: {} bytes", page.slug, rendered.bytes);

        Ok(rendered.output)
    }

    /// Turn a page entry into a fully resolved page spec.
    fn page_spec(&self, page: &PageConfig) -> Result<PageSpec, BuildError> {
        Ok(PageSpec {
            template: self.template_path(page)?,
            head: page.head.clone().unwrap_or_default(),
            body: page.body.clone().unwrap_or_default(),
            script: self.config.root.join(&page.script),
            title: page
                .title
                .clone()
                .unwrap_or_else(|| self.config.title.clone()),
            output: self.output_path(page),
        })
    }

    /// Look up a preset, falling back to a literal path for names with an
    /// extension or a directory component.
    fn template_path(&self, page: &PageConfig) -> Result<PathBuf, BuildError> {
        if let Some(path) = self.config.presets.get(&page.template) {
            return Ok(path.clone());
        }

        let literal = Path::new(&page.template);
        if literal.extension().is_some() || literal.components().count() > 1 {
            return Ok(literal.to_path_buf());
        }

        Err(BuildError::UnknownPreset {
            page: page.slug.clone(),
            preset: page.template.clone(),
        })
    }

    /// Calculate the output path for a page.
    fn output_path(&self, page: &PageConfig) -> PathBuf {
        match &self.config.output_dir {
            Some(dir) => {
                let name = page
                    .output
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(format!("{}.html", page.slug)));
                dir.join(name)
            }
            None => self.config.root.join(&page.output),
        }
    }
}
