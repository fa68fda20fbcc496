use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DeepDocError;

/// MCP server identity advertised to clients.
pub const SERVER_NAME: &str = "appledeepdoc-mcp";

/// Environment variable overriding documentation discovery with a single path.
pub const DOC_PATH_ENV: &str = "XCODE_DOC_PATH";

/// Location of the hidden documentation inside an Xcode bundle.
const DOC_SUBPATH: &str =
    "Contents/PlugIns/IDEIntelligenceChat.framework/Versions/A/Resources/AdditionalDocumentation";

const APPLICATIONS_DIR: &str = "/Applications";

/// Discovers the `AdditionalDocumentation` folders shipped inside installed
/// Xcode bundles, or honors an explicit override path.
#[derive(Clone, Debug)]
pub struct DocDiscovery {
    applications_dir: PathBuf,
    override_path: Option<PathBuf>,
}

impl DocDiscovery {
    /// Standard discovery: `XCODE_DOC_PATH` override first, then `/Applications`.
    pub fn from_env() -> Self {
        Self {
            applications_dir: PathBuf::from(APPLICATIONS_DIR),
            override_path: env::var_os(DOC_PATH_ENV).map(PathBuf::from),
        }
    }

    /// Discovery pinned to one explicit documentation directory.
    pub fn with_override(path: impl Into<PathBuf>) -> Self {
        Self {
            applications_dir: PathBuf::from(APPLICATIONS_DIR),
            override_path: Some(path.into()),
        }
    }

    /// Discovery scanning an alternate applications directory.
    pub fn with_applications_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            applications_dir: dir.into(),
            override_path: None,
        }
    }

    /// Resolves the documentation paths to index.
    ///
    /// An override path must exist; without an override, every `Xcode*.app`
    /// under the applications directory is probed and kept when its
    /// documentation folder contains at least one markdown file.
    pub fn documentation_paths(&self) -> Result<Vec<PathBuf>, DeepDocError> {
        if let Some(custom) = &self.override_path {
            if !custom.exists() {
                return Err(DeepDocError::Config(format!(
                    "custom documentation path does not exist: {}",
                    custom.display()
                )));
            }
            return Ok(vec![custom.clone()]);
        }

        let paths = self.scan_applications();
        if paths.is_empty() {
            return Err(DeepDocError::Config(format!(
                "no Xcode installations with additional documentation found; \
                 searched {} for Xcode*.app. Set {} to specify a custom path",
                self.applications_dir.display(),
                DOC_PATH_ENV
            )));
        }
        Ok(paths)
    }

    fn scan_applications(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(&self.applications_dir) else {
            return Vec::new();
        };

        let mut candidates: Vec<PathBuf> = entries
            .flatten()
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                name.starts_with("Xcode") && name.ends_with(".app")
            })
            .map(|entry| entry.path())
            .collect();
        candidates.sort();

        let mut paths = Vec::new();
        for xcode_app in candidates {
            let doc_path = xcode_app.join(DOC_SUBPATH);
            if doc_path.is_dir() && contains_markdown(&doc_path) {
                tracing::info!(
                    xcode = %xcode_name_from_path(&doc_path),
                    "found documentation bundle"
                );
                paths.push(doc_path);
            }
        }
        paths
    }
}

fn contains_markdown(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .any(|entry| entry.path().extension().is_some_and(|ext| ext == "md"))
        })
        .unwrap_or(false)
}

/// Extracts the Xcode bundle name (e.g. `Xcode-26.0.0.app`) owning a
/// documentation path.
pub fn xcode_name_from_path(path: &Path) -> String {
    for ancestor in path.ancestors() {
        if ancestor.extension().is_some_and(|ext| ext == "app") {
            if let Some(name) = ancestor.file_name() {
                return name.to_string_lossy().into_owned();
            }
        }
    }

    path.components()
        .nth(2)
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .unwrap_or_else(|| "Xcode".to_string())
}
