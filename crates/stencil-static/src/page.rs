//! Single page rendering.

use std::fs;
use std::path::{Path, PathBuf};

use stencil_fragments::FragmentResolver;

use crate::builder::BuildError;
use crate::template::{PageParts, PageTemplate};

/// Everything needed to render one page.
#[derive(Debug, Clone)]
pub struct PageSpec {
    /// Base template, relative to the root
    pub template: PathBuf,

    /// Head entry document, relative to the root (empty for none)
    pub head: String,

    /// Body entry document, relative to the root (empty for none)
    pub body: String,

    /// Pre-built script payload, used as given
    pub script: PathBuf,

    /// Document title
    pub title: String,

    /// Destination file, used as given
    pub output: PathBuf,
}

/// A page written to disk.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Where the page was written
    pub output: PathBuf,

    /// Size of the written page in bytes
    pub bytes: usize,
}

/// Compose a page without writing it.
///
/// Head and body share one resolver, so a fragment included by both is read
/// once.
pub fn compose_page(root: &Path, spec: &PageSpec) -> Result<String, BuildError> {
    let mut resolver = FragmentResolver::new(root);

    let head = resolver.render_entry(&spec.head)?;
    let body = resolver.render_entry(&spec.body)?;

    let script = read_text(&spec.script)?;

    let template_path = root.join(&spec.template);
    let template = PageTemplate::new(read_text(&template_path)?).map_err(|source| {
        BuildError::TemplateError {
            path: template_path.clone(),
            source,
        }
    })?;

    Ok(template.render(&PageParts {
        title: &spec.title,
        head: &head,
        body: &body,
        script: script.trim(),
    }))
}

/// Compose a page and write it, creating missing parent directories.
///
/// Nothing is written unless every fragment, the script and the template
/// were read successfully.
pub fn render_page(root: &Path, spec: &PageSpec) -> Result<RenderedPage, BuildError> {
    let html = compose_page(root, spec)?;

    if let Some(parent) = spec.output.parent() {
        fs::create_dir_all(parent).map_err(|source| BuildError::WriteError {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&spec.output, &html).map_err(|source| BuildError::WriteError {
        path: spec.output.clone(),
        source,
    })?;

    Ok(RenderedPage {
        output: spec.output.clone(),
        bytes: html.len(),
    })
}

fn read_text(path: &Path) -> Result<String, BuildError> {
    fs::read_to_string(path).map_err(|source| BuildError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}
