//! Locating, listing and parsing the OpenAPI documents inside the clone.
//!
//! Spec files are read as YAML, which also accepts JSON text. Each document
//! is checked for the OpenAPI skeleton (`openapi`/`swagger`, `info`, `paths`)
//! and every `$ref` in it must resolve, either as a JSON pointer into the
//! same document or into a sibling file. A single bad file fails the whole
//! batch.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Substring that excludes a directory entry from parsing.
///
/// This is a plain substring test on the file name, not an extension check:
/// `spec.json.bak` and `my.jsontype.yaml` are skipped, `specjson.yaml` is not.
pub const EXCLUDED_NAME_FRAGMENT: &str = ".json";

/// One parsed and validated OpenAPI document.
#[derive(Debug, Clone)]
pub struct SpecDocument {
    /// File the document was read from.
    pub path: PathBuf,

    /// Declared version, from `openapi` (3.x) or `swagger` (2.0).
    pub version: String,

    /// `info.title`.
    pub title: String,

    /// `info.version`, the version of the described API.
    pub api_version: String,

    /// `components.schemas` in document order, if the document declares it.
    pub schemas: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    openapi: Option<String>,
    #[serde(default)]
    swagger: Option<String>,
    #[serde(default)]
    info: Option<RawInfo>,
    #[serde(default)]
    paths: Option<Map<String, Value>>,
    #[serde(default)]
    webhooks: Option<Map<String, Value>>,
    #[serde(default)]
    components: Option<RawComponents>,
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    title: String,
    version: String,
}

#[derive(Debug, Deserialize)]
struct RawComponents {
    #[serde(default)]
    schemas: Option<Map<String, Value>>,
}

/// Directory holding the spec files: `<repo_root>/<spec>`.
///
/// `spec` is always taken relative to the clone, so a leading `/` (or a
/// drive prefix) cannot point the loader outside it.
pub fn spec_dir(repo_root: &Path, spec: &str) -> PathBuf {
    let relative: PathBuf = Path::new(spec)
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect();
    repo_root.join(relative)
}

/// Whether a directory entry should be parsed as a spec file.
pub fn is_spec_file_name(name: &str) -> bool {
    !name.contains(EXCLUDED_NAME_FRAGMENT)
}

/// List the entries of `dir` that pass [`is_spec_file_name`], sorted by name.
pub async fn spec_file_names(dir: &Path) -> Result<Vec<String>> {
    let read_err = |e| Error::Read {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_err)?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_spec_file_name(&name) {
            names.push(name);
        } else {
            debug!(name, "Skipping JSON spec entry");
        }
    }
    names.sort();
    Ok(names)
}

/// Join each file name onto the spec directory.
pub fn collect_spec_paths(names: &[String], dir: &Path) -> Vec<PathBuf> {
    names.iter().map(|name| dir.join(name)).collect()
}

/// Parse every spec file concurrently.
///
/// The batch is all-or-nothing: the first failing file is returned as the
/// error and no documents are produced.
pub async fn parse_documents(paths: &[PathBuf]) -> Result<Vec<SpecDocument>> {
    futures::future::try_join_all(paths.iter().map(|path| parse_document(path))).await
}

/// Read, parse and validate a single OpenAPI document.
pub async fn parse_document(path: &Path) -> Result<SpecDocument> {
    debug!(path = %path.display(), "Parsing spec file");
    let root = load_value(path).await?;

    if !root.is_object() {
        return Err(Error::invalid_spec(path, "document root is not a mapping"));
    }

    let raw: RawDocument = serde_json::from_value(root.clone())
        .map_err(|e| Error::invalid_spec(path, e.to_string()))?;
    let version = check_version(path, &raw)?;

    let info = raw
        .info
        .ok_or_else(|| Error::invalid_spec(path, "missing required field `info`"))?;

    resolve_refs(path, &root).await?;

    Ok(SpecDocument {
        path: path.to_path_buf(),
        version,
        title: info.title,
        api_version: info.version,
        schemas: raw.components.and_then(|c| c.schemas),
    })
}

async fn load_value(path: &Path) -> Result<Value> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
    serde_yaml::from_str(&content).map_err(|e| Error::Yaml {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Validate the version marker and the top-level fields it requires.
fn check_version(path: &Path, raw: &RawDocument) -> Result<String> {
    match (&raw.openapi, &raw.swagger) {
        (Some(v), _) if v.starts_with("3.0") => {
            if raw.paths.is_none() {
                return Err(Error::invalid_spec(path, "missing required field `paths`"));
            }
            Ok(v.clone())
        }
        (Some(v), _) if v.starts_with("3.") => {
            // 3.1 relaxed `paths`, but an empty document is still invalid.
            if raw.paths.is_none() && raw.webhooks.is_none() && raw.components.is_none() {
                return Err(Error::invalid_spec(
                    path,
                    "one of `paths`, `webhooks` or `components` is required",
                ));
            }
            Ok(v.clone())
        }
        (Some(v), _) => Err(Error::invalid_spec(
            path,
            format!("unsupported OpenAPI version '{v}'"),
        )),
        (None, Some(v)) if v == "2.0" => {
            if raw.paths.is_none() {
                return Err(Error::invalid_spec(path, "missing required field `paths`"));
            }
            Ok(v.clone())
        }
        (None, Some(v)) => Err(Error::invalid_spec(
            path,
            format!("unsupported Swagger version '{v}'"),
        )),
        (None, None) => Err(Error::invalid_spec(
            path,
            "missing `openapi` or `swagger` version field",
        )),
    }
}

/// Check that every `$ref` in `root` points at something that exists.
async fn resolve_refs(path: &Path, root: &Value) -> Result<()> {
    let mut refs = Vec::new();
    collect_refs(root, &mut refs);

    let base = path.parent().unwrap_or(Path::new("."));
    let mut external: HashMap<PathBuf, Value> = HashMap::new();

    for reference in refs {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            warn!(
                path = %path.display(),
                reference,
                "Remote $ref is not resolved"
            );
            continue;
        }

        let (file, fragment) = match reference.split_once('#') {
            Some((file, fragment)) => (file, fragment),
            None => (reference, ""),
        };

        let target = if file.is_empty() {
            root
        } else {
            let file_path = base.join(file);
            if !external.contains_key(&file_path) {
                let value = load_value(&file_path).await.map_err(|e| {
                    Error::invalid_spec(path, format!("unresolved $ref '{reference}': {e}"))
                })?;
                external.insert(file_path.clone(), value);
            }
            &external[&file_path]
        };

        if !fragment.is_empty() && target.pointer(fragment).is_none() {
            return Err(Error::invalid_spec(
                path,
                format!("unresolved $ref '{reference}'"),
            ));
        }
    }

    Ok(())
}

fn collect_refs<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match (key.as_str(), child) {
                    ("$ref", Value::String(reference)) => out.push(reference),
                    _ => collect_refs(child, out),
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_refs(item, out)),
        _ => {}
    }
}
