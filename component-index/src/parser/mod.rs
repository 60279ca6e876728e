//! Component documentation parser.
//!
//! Walks `<source_root>/components/*` and emits one [`ParsedComponent`] per
//! candidate directory. Extraction is tolerant per component: any failure
//! yields a `status: error` entry and the walk continues. Only an
//! unlistable components directory aborts the whole scan.
//!
//! Expected tree per component:
//!
//! ```text
//! <root>/package.json              name + version of the package
//! <root>/components/button/
//!   index.en-US.md                 description + `## API` section
//!   demo/*.tsx                     code examples
//!   index.ts                       relative imports → dependencies
//! ```

mod tags;

pub use tags::tags_for;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tokio::fs;
use tracing::{debug, trace, warn};

use crate::errors::{RciError, RciResult};
use crate::record::{ComponentDoc, ParseStatus, ParsedComponent};

const MAX_DESCRIPTION_CHARS: usize = 1000;
const MAX_API_CHARS: usize = 2000;
const MAX_EXAMPLE_CHARS: usize = 1000;
const MAX_EXAMPLES: usize = 3;

/// Placeholder stored when a component has no `## API` section.
pub const API_FALLBACK: &str = "API documentation not available";

/// Parser over a single component source tree.
pub struct ComponentParser {
    /// Namespace used when `package.json` carries no `name`.
    default_package: String,
}

impl ComponentParser {
    pub fn new(default_package: impl Into<String>) -> Self {
        Self {
            default_package: default_package.into(),
        }
    }

    /// Parses every component under `<source_root>/components`.
    ///
    /// Directories whose name starts with `_` are skipped. Per-component
    /// failures are recorded in the returned entries; an unlistable
    /// components directory is fatal.
    ///
    /// # Errors
    /// Returns [`RciError::SourceTree`] when the components directory
    /// cannot be listed.
    pub async fn parse_all(&self, source_root: &Path) -> RciResult<Vec<ParsedComponent>> {
        let components_dir = source_root.join("components");
        let mut entries = fs::read_dir(&components_dir)
            .await
            .map_err(|e| source_tree_error(&components_dir, e))?;

        let (package_name, version) = self.read_manifest(source_root).await;
        debug!(
            package = %package_name,
            version = %version,
            root = %source_root.display(),
            "scanning component tree"
        );

        let mut dirs: Vec<(String, PathBuf)> = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| source_tree_error(&components_dir, e))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('_') {
                continue;
            }
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if is_dir {
                dirs.push((name, entry.path()));
            }
        }
        dirs.sort_by(|a, b| a.0.cmp(&b.0));

        let mut out = Vec::with_capacity(dirs.len());
        for (dir_name, dir) in dirs {
            let component_name = capitalize(&dir_name);
            match self
                .parse_component(&dir, &dir_name, &package_name, &version)
                .await
            {
                Ok(info) => {
                    trace!(component = %info.component_name, "parsed component");
                    out.push(ParsedComponent {
                        info,
                        file_path: dir.display().to_string(),
                        status: ParseStatus::Success,
                        error: None,
                    });
                }
                Err(e) => {
                    warn!(component = %component_name, error = %e, "component parse failed");
                    out.push(ParsedComponent {
                        info: ComponentDoc::empty(&component_name, &package_name),
                        file_path: dir.display().to_string(),
                        status: ParseStatus::Error,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        debug!(count = out.len(), "component scan finished");
        Ok(out)
    }

    /// Reads `name` and `version` from `<root>/package.json`, falling back
    /// to the configured default package and `"1.0.0"`.
    async fn read_manifest(&self, source_root: &Path) -> (String, String) {
        let manifest = source_root.join("package.json");
        let parsed = match fs::read_to_string(&manifest).await {
            Ok(raw) => serde_json::from_str::<serde_json::Value>(&raw).ok(),
            Err(_) => None,
        };
        let name = parsed
            .as_ref()
            .and_then(|v| v.get("name"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| self.default_package.clone());
        let version = parsed
            .as_ref()
            .and_then(|v| v.get("version"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| "1.0.0".to_string());
        (name, version)
    }

    async fn parse_component(
        &self,
        dir: &Path,
        dir_name: &str,
        package_name: &str,
        version: &str,
    ) -> RciResult<ComponentDoc> {
        let component_name = capitalize(dir_name);

        let doc_text = fs::read_to_string(dir.join("index.en-US.md")).await.ok();
        let examples = read_examples(&dir.join("demo")).await;

        // A directory with neither a doc page nor demos has nothing to index.
        if doc_text.is_none() && examples.is_empty() {
            return Err(RciError::ComponentParse {
                component: component_name,
                message: "no documentation or examples found".into(),
            });
        }

        let description = doc_text
            .as_deref()
            .and_then(extract_description)
            .map(|d| clamp_chars(&d, MAX_DESCRIPTION_CHARS))
            .unwrap_or_else(|| format!("{component_name} component"));

        let api = doc_text
            .as_deref()
            .and_then(extract_api)
            .map(|a| clamp_chars(&a, MAX_API_CHARS))
            .unwrap_or_else(|| API_FALLBACK.to_string());

        let dependencies = match fs::read_to_string(dir.join("index.ts")).await {
            Ok(src) => extract_dependencies(&src),
            Err(_) => Vec::new(),
        };

        Ok(ComponentDoc {
            package_name: package_name.to_string(),
            component_name,
            description,
            api,
            examples,
            tags: tags_for(dir_name),
            version: version.to_string(),
            dependencies,
            updated_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

/// Maps a components-directory listing failure.
///
/// Permission problems keep their `io::Error` kind so the HTTP layer can
/// answer 403 instead of treating the tree as missing.
fn source_tree_error(dir: &Path, e: std::io::Error) -> RciError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => RciError::Io(e),
        _ => RciError::SourceTree(format!("{}: {e}", dir.display())),
    }
}

/// PascalCase transform: `date-picker` → `DatePicker`.
pub fn capitalize(name: &str) -> String {
    name.split('-')
        .map(|seg| {
            let mut chars = seg.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Description slab: the lines between the first `---` separator and the
/// first subsequent `## ` heading, with blank and separator lines stripped,
/// joined by single spaces.
fn extract_description(doc: &str) -> Option<String> {
    let mut lines = doc.lines();
    lines.find(|line| line.trim_start().starts_with("---"))?;

    let mut parts: Vec<&str> = Vec::new();
    for line in lines {
        let trimmed = line.trim();
        if trimmed.starts_with("## ") {
            break;
        }
        if trimmed.is_empty() || trimmed.starts_with("---") {
            continue;
        }
        parts.push(trimmed);
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// API section: from the `## API` heading up to (excluding) the next `## `
/// heading that is not `## API`.
fn extract_api(doc: &str) -> Option<String> {
    let mut collected: Vec<&str> = Vec::new();
    let mut in_api = false;
    for line in doc.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("## ") {
            let is_api_heading = trimmed.trim_end() == "## API";
            if in_api && !is_api_heading {
                break;
            }
            in_api = is_api_heading || in_api;
            if !in_api {
                continue;
            }
        }
        if in_api {
            collected.push(line);
        }
    }

    if collected.is_empty() {
        None
    } else {
        Some(collected.join("\n").trim().to_string())
    }
}

/// Up to three lexicographically-first `demo/*.tsx` snippets with import
/// lines stripped; empty remainders are discarded.
async fn read_examples(demo_dir: &Path) -> Vec<String> {
    let mut entries = match fs::read_dir(demo_dir).await {
        Ok(e) => e,
        Err(_) => return Vec::new(),
    };

    let mut files: Vec<PathBuf> = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("tsx") {
            files.push(path);
        }
    }
    files.sort();

    let mut out = Vec::new();
    for path in files.into_iter().take(MAX_EXAMPLES) {
        let Ok(src) = fs::read_to_string(&path).await else {
            continue;
        };
        let body = strip_imports(&src);
        if body.trim().is_empty() {
            continue;
        }
        out.push(clamp_chars(body.trim(), MAX_EXAMPLE_CHARS));
    }
    out
}

fn strip_imports(src: &str) -> String {
    src.lines()
        .filter(|line| !line.trim_start().starts_with("import"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Sibling imports of `index.ts`, capitalized: `from '../button'` → `Button`.
fn extract_dependencies(src: &str) -> Vec<String> {
    static RELATIVE_IMPORT: OnceLock<Regex> = OnceLock::new();
    let re = RELATIVE_IMPORT
        .get_or_init(|| Regex::new(r#"from ['"]\.\./([^'"]+)['"]"#).expect("valid regex"));

    let mut out: Vec<String> = Vec::new();
    for cap in re.captures_iter(src) {
        let segment = cap[1].split('/').next().unwrap_or_default();
        if segment.is_empty() {
            continue;
        }
        let name = capitalize(segment);
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

/// Char-boundary-safe clamp.
fn clamp_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}
