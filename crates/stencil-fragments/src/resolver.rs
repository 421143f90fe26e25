//! Recursive fragment expansion with a per-render cache.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::marker::find_include;
use crate::source::{FragmentSource, FsSource};

/// Errors that can occur while expanding fragments.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Failed to read fragment {}: {source}", .path.display())]
    MissingFragment {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Include cycle detected: {}", DisplayChain(.chain))]
    Cycle { chain: Vec<PathBuf> },
}

impl ResolveError {
    /// The path of the fragment that failed to load.
    pub fn path(&self) -> &Path {
        match self {
            Self::MissingFragment { path, .. } => path,
            Self::Cycle { chain } => chain
                .last()
                .map(PathBuf::as_path)
                .unwrap_or(Path::new("")),
        }
    }
}

struct DisplayChain<'a>(&'a [PathBuf]);

impl fmt::Display for DisplayChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, path) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{}", path.display())?;
        }
        Ok(())
    }
}

/// Expands include markers against a fixed source.
///
/// One resolver is one render: its cache lives exactly as long as the value,
/// so build a fresh resolver per page (and never share one across roots).
pub struct FragmentResolver<S = FsSource> {
    source: S,

    /// Expanded text by resolved fragment path
    cache: HashMap<PathBuf, String>,

    /// Fragments currently being expanded, outermost first
    in_progress: Vec<PathBuf>,
}

impl FragmentResolver<FsSource> {
    /// Create a resolver reading fragments below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_source(FsSource::new(root))
    }
}

impl<S: FragmentSource> FragmentResolver<S> {
    /// Create a resolver over an arbitrary fragment source.
    pub fn with_source(source: S) -> Self {
        Self {
            source,
            cache: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    /// The source fragments are read from.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Expand every include marker in `text`.
    ///
    /// The leftmost marker is replaced by its fragment's expanded text and the
    /// whole result is scanned again, until no marker remains.
    pub fn expand(&mut self, text: &str) -> Result<String, ResolveError> {
        let mut rendered = text.to_string();

        while let Some(marker) = find_include(&rendered) {
            let span = marker.span.clone();
            let path = marker.path.to_string();

            let fragment = self.load_fragment(&path)?;
            rendered.replace_range(span, &fragment);
        }

        Ok(rendered)
    }

    /// Load a fragment by relative path, expanding it on first use.
    ///
    /// The raw text is trimmed before expansion and the expansion is trimmed
    /// again, so a fragment never contributes leading or trailing whitespace.
    /// Later calls for the same resolved path return the cached text without
    /// touching the source.
    pub fn load_fragment(&mut self, relative: &str) -> Result<String, ResolveError> {
        let key = self.source.resolve(relative);

        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!("Fragment cache hit: {}", key.display());
            return Ok(cached.clone());
        }

        if self.in_progress.contains(&key) {
            let mut chain = self.in_progress.clone();
            chain.push(key);
            return Err(ResolveError::Cycle { chain });
        }

        let raw = self
            .source
            .read(&key)
            .map_err(|source| ResolveError::MissingFragment {
                path: key.clone(),
                source,
            })?;

        tracing::debug!("Loaded fragment {}", key.display());

        self.in_progress.push(key.clone());
        let expanded = self.expand(raw.trim());
        self.in_progress.pop();

        let expanded = expanded?.trim().to_string();
        self.cache.insert(key, expanded.clone());

        Ok(expanded)
    }

    /// Render a top-level entry document.
    ///
    /// An empty path renders to empty text without reading anything. Entry
    /// documents are not cached.
    pub fn render_entry(&mut self, relative: &str) -> Result<String, ResolveError> {
        if relative.is_empty() {
            return Ok(String::new());
        }

        let path = self.source.resolve(relative);
        let raw = self
            .source
            .read(&path)
            .map_err(|source| ResolveError::MissingFragment { path, source })?;

        Ok(self.expand(&raw)?.trim().to_string())
    }

    /// Whether the fragment at `relative` has already been expanded.
    pub fn is_cached(&self, relative: &str) -> bool {
        self.cache.contains_key(&self.source.resolve(relative))
    }

    /// Number of distinct fragments expanded so far.
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    /// File system source that counts reads per file name.
    struct CountingSource {
        inner: FsSource,
        reads: RefCell<HashMap<String, usize>>,
    }

    impl CountingSource {
        fn new(root: &Path) -> Self {
            Self {
                inner: FsSource::new(root),
                reads: RefCell::new(HashMap::new()),
            }
        }

        fn reads_of(&self, name: &str) -> usize {
            self.reads.borrow().get(name).copied().unwrap_or(0)
        }

        fn total_reads(&self) -> usize {
            self.reads.borrow().values().sum()
        }
    }

    impl FragmentSource for CountingSource {
        fn resolve(&self, relative: &str) -> PathBuf {
            self.inner.resolve(relative)
        }

        fn read(&self, resolved: &Path) -> io::Result<String> {
            let name = resolved
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            *self.reads.borrow_mut().entry(name).or_default() += 1;
            self.inner.read(resolved)
        }
    }

    fn site(files: &[(&str, &str)]) -> TempDir {
        let temp = tempdir().unwrap();
        for (path, content) in files {
            let path = temp.path().join(path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
        temp
    }

    fn counting(temp: &TempDir) -> FragmentResolver<CountingSource> {
        FragmentResolver::with_source(CountingSource::new(temp.path()))
    }

    #[test]
    fn renders_simple_include() {
        let temp = site(&[
            ("base.html", "Hello {{> name.html }}!"),
            ("name.html", "World"),
        ]);
        let mut resolver = FragmentResolver::new(temp.path());

        let html = resolver.render_entry("base.html").unwrap();

        assert_eq!(html, "Hello World!");
    }

    #[test]
    fn expands_nested_includes() {
        let temp = site(&[
            ("page.html", "<main>{{> partials/card.html }}</main>"),
            ("partials/card.html", "<div>{{>partials/label.html}}</div>"),
            ("partials/label.html", "<span>7</span>"),
        ]);
        let mut resolver = FragmentResolver::new(temp.path());

        let html = resolver.render_entry("page.html").unwrap();

        assert_eq!(html, "<main><div><span>7</span></div></main>");
        assert_eq!(resolver.cached_count(), 2);
    }

    #[test]
    fn expand_leaves_plain_text_untouched() {
        let temp = site(&[]);
        let mut resolver = counting(&temp);

        let text = "  <p>{{ not-an-include }} and {{> }}</p>\n";
        let expanded = resolver.expand(text).unwrap();

        assert_eq!(expanded, text);
        assert_eq!(resolver.source().total_reads(), 0);
    }

    #[test]
    fn shared_fragment_is_read_once() {
        let temp = site(&[
            ("page.html", "{{> x.html }}|{{> y.html }}"),
            ("x.html", "x:{{> shared.html }}"),
            ("y.html", "y:{{> shared.html }}"),
            ("shared.html", "<b>shared</b>"),
        ]);
        let mut resolver = counting(&temp);

        let html = resolver.render_entry("page.html").unwrap();

        assert_eq!(html, "x:<b>shared</b>|y:<b>shared</b>");
        assert_eq!(resolver.source().reads_of("shared.html"), 1);
    }

    #[test]
    fn cache_hits_return_identical_text() {
        let temp = site(&[
            ("icon.html", "  <svg>{{> path.html }}</svg>\n"),
            ("path.html", "<path/>"),
        ]);
        let mut resolver = counting(&temp);

        let first = resolver.load_fragment("icon.html").unwrap();
        let second = resolver.load_fragment("./icon.html").unwrap();

        assert_eq!(first, second);
        assert_eq!(first, "<svg><path/></svg>");
        assert_eq!(resolver.source().reads_of("icon.html"), 1);
        assert_eq!(resolver.source().reads_of("path.html"), 1);
    }

    #[test]
    fn repeated_marker_in_one_text_loads_once() {
        let temp = site(&[("dot.html", ".")]);
        let mut resolver = counting(&temp);

        let expanded = resolver
            .expand("{{> dot.html }}{{> dot.html }}{{> dot.html }}")
            .unwrap();

        assert_eq!(expanded, "...");
        assert_eq!(resolver.source().reads_of("dot.html"), 1);
    }

    #[test]
    fn strips_outer_whitespace_only() {
        let temp = site(&[
            ("entry.html", "\n\n  <ul>\n    {{> item.html }}\n  </ul>  \n"),
            ("item.html", "\t<li>one  two</li>\n\n"),
        ]);
        let mut resolver = FragmentResolver::new(temp.path());

        let html = resolver.render_entry("entry.html").unwrap();

        assert_eq!(html, "<ul>\n    <li>one  two</li>\n  </ul>");
    }

    #[test]
    fn fragment_result_is_trimmed_after_expansion() {
        let temp = site(&[
            ("outer.html", "{{> blank.html }}  text"),
            ("blank.html", "   \n"),
        ]);
        let mut resolver = FragmentResolver::new(temp.path());

        let fragment = resolver.load_fragment("outer.html").unwrap();

        assert_eq!(fragment, "text");
    }

    #[test]
    fn empty_entry_path_does_not_touch_storage() {
        let temp = site(&[]);
        let mut resolver = counting(&temp);

        let html = resolver.render_entry("").unwrap();

        assert_eq!(html, "");
        assert_eq!(resolver.source().total_reads(), 0);
    }

    #[test]
    fn entry_documents_are_not_cached() {
        let temp = site(&[("body.html", "<body/>")]);
        let mut resolver = counting(&temp);

        resolver.render_entry("body.html").unwrap();
        resolver.render_entry("body.html").unwrap();

        assert!(!resolver.is_cached("body.html"));
        assert_eq!(resolver.source().reads_of("body.html"), 2);
    }

    #[test]
    fn spliced_text_can_complete_a_marker() {
        let temp = site(&[("open.html", "{{>"), ("tail.html", "tail")]);
        let mut resolver = FragmentResolver::new(temp.path());

        let expanded = resolver.expand("{{> open.html }} tail.html }}").unwrap();

        assert_eq!(expanded, "tail");
    }

    #[test]
    fn acyclic_graph_leaves_no_markers() {
        let temp = site(&[
            ("a.html", "{{> b.html }}{{> c.html }}"),
            ("b.html", "{{> d.html }}-b"),
            ("c.html", "{{> d.html }}-c"),
            ("d.html", "d"),
        ]);
        let mut resolver = FragmentResolver::new(temp.path());

        let html = resolver.render_entry("a.html").unwrap();

        assert_eq!(html, "d-bd-c");
        assert!(crate::find_include(&html).is_none());
    }

    #[test]
    fn missing_fragment_fails_with_path() {
        let temp = site(&[("page.html", "before {{> missing.html }} after")]);
        let mut resolver = FragmentResolver::new(temp.path());

        let err = resolver.render_entry("page.html").unwrap_err();

        assert!(matches!(err, ResolveError::MissingFragment { .. }));
        assert!(err.path().ends_with("missing.html"));
        assert!(err.to_string().contains("missing.html"));
    }

    #[test]
    fn missing_entry_fails() {
        let temp = site(&[]);
        let mut resolver = FragmentResolver::new(temp.path());

        let err = resolver.render_entry("head.html").unwrap_err();

        assert!(err.path().ends_with("head.html"));
    }

    #[test]
    fn failed_fragments_are_not_cached() {
        let temp = site(&[
            ("parent.html", "{{> good.html }}{{> broken.html }}"),
            ("good.html", "ok"),
        ]);
        let mut resolver = FragmentResolver::new(temp.path());

        assert!(resolver.load_fragment("parent.html").is_err());

        assert!(resolver.is_cached("good.html"));
        assert!(!resolver.is_cached("parent.html"));
        assert!(!resolver.is_cached("broken.html"));
    }

    #[test]
    fn direct_cycle_fails() {
        let temp = site(&[("a.html", "{{> b.html }}"), ("b.html", "{{> a.html }}")]);
        let mut resolver = FragmentResolver::new(temp.path());

        let err = resolver.load_fragment("a.html").unwrap_err();

        let ResolveError::Cycle { chain } = &err else {
            panic!("expected a cycle error, got {err}");
        };
        assert_eq!(chain.len(), 3);
        assert!(chain[0].ends_with("a.html"));
        assert!(chain[1].ends_with("b.html"));
        assert!(chain[2].ends_with("a.html"));
        assert_eq!(resolver.cached_count(), 0);
    }

    #[test]
    fn self_include_fails() {
        let temp = site(&[
            ("page.html", "{{> loop.html }}"),
            ("loop.html", "again {{> loop.html }}"),
        ]);
        let mut resolver = FragmentResolver::new(temp.path());

        let err = resolver.render_entry("page.html").unwrap_err();

        assert!(matches!(err, ResolveError::Cycle { .. }));
        assert!(err.to_string().contains(" -> "));
    }

    #[test]
    fn resolver_recovers_after_cycle_error() {
        let temp = site(&[("a.html", "{{> a.html }}"), ("fine.html", "fine")]);
        let mut resolver = FragmentResolver::new(temp.path());

        assert!(resolver.load_fragment("a.html").is_err());

        assert_eq!(resolver.load_fragment("fine.html").unwrap(), "fine");
    }
}
