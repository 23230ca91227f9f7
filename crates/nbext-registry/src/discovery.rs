//! Discovery of yaml extension descriptors under nbextensions directories.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::descriptor::{DEFAULT_COMPATIBILITY, DEFAULT_SECTION};
use crate::{ExtensionDescriptor, RegistryError};

const VALID_DESCRIPTOR_TYPES: [&str; 2] = ["IPython Notebook Extension", "Jupyter Notebook Extension"];
const DEFAULT_EXCLUDED_DIRS: [&str; 1] = ["mathjax"];

fn absolute_url() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(f|ht)tps?://").expect("valid regex"))
}

#[derive(Debug, Clone, PartialEq)]
/// Public struct `DiscoveredDescriptor` pairing a descriptor with its yaml file.
pub struct DiscoveredDescriptor {
    pub yaml_path: PathBuf,
    pub descriptor: ExtensionDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `InvalidDescriptorFile` recording a yaml file that was skipped.
pub struct InvalidDescriptorFile {
    pub yaml_path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
/// Public struct `DiscoveryReport` returned by `discover_descriptors`.
pub struct DiscoveryReport {
    pub roots: Vec<PathBuf>,
    pub entries: Vec<DiscoveredDescriptor>,
    pub invalid_entries: Vec<InvalidDescriptorFile>,
}

impl DiscoveryReport {
    pub fn descriptors(&self) -> Vec<ExtensionDescriptor> {
        self.entries
            .iter()
            .map(|entry| entry.descriptor.clone())
            .collect()
    }
}

/// Walks each root for `.yaml`/`.yml` descriptors.
///
/// Roots are visited once each, symlinks are followed, and `mathjax`
/// directories are skipped. Files that fail to parse or validate are
/// reported as invalid entries rather than aborting the walk. A later file
/// declaring an already-seen `require` replaces the earlier entry and is
/// flagged as a duplicate.
pub fn discover_descriptors<P: AsRef<Path>>(roots: &[P]) -> DiscoveryReport {
    let mut report = DiscoveryReport::default();
    let mut visited_roots = HashSet::new();
    for root in roots {
        let root = root.as_ref();
        let root_key = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        if !visited_roots.insert(root_key) {
            continue;
        }
        report.roots.push(root.to_path_buf());
        tracing::debug!(root = %root.display(), "looking for nbextension yaml descriptor files");

        let mut yaml_paths = Vec::new();
        let mut visited_dirs = HashSet::new();
        collect_yaml_paths(root, &mut visited_dirs, &mut yaml_paths);
        for yaml_path in yaml_paths {
            let relative = yaml_path.strip_prefix(root).unwrap_or(&yaml_path);
            let relative_url_base = relative
                .parent()
                .map(path_to_url)
                .unwrap_or_default();
            match load_descriptor_file(&yaml_path, &relative_url_base) {
                Ok(descriptor) => insert_descriptor(&mut report, yaml_path, descriptor),
                Err(error) => {
                    tracing::warn!(path = %yaml_path.display(), error = %error, "skipping nbextension yaml file");
                    report.invalid_entries.push(InvalidDescriptorFile {
                        yaml_path,
                        error: error.to_string(),
                    });
                }
            }
        }
    }
    report
}

fn insert_descriptor(
    report: &mut DiscoveryReport,
    yaml_path: PathBuf,
    mut descriptor: ExtensionDescriptor,
) {
    let existing = report
        .entries
        .iter_mut()
        .find(|entry| entry.descriptor.require == descriptor.require);
    match existing {
        Some(entry) => {
            tracing::warn!(
                require = %descriptor.require,
                first = %entry.yaml_path.display(),
                second = %yaml_path.display(),
                "nbextension has duplicate listings"
            );
            descriptor.duplicate = true;
            *entry = DiscoveredDescriptor {
                yaml_path,
                descriptor,
            };
        }
        None => {
            tracing::debug!(require = %descriptor.require, path = %yaml_path.display(), "found nbextension");
            report.entries.push(DiscoveredDescriptor {
                yaml_path,
                descriptor,
            });
        }
    }
}

fn collect_yaml_paths(dir: &Path, visited: &mut HashSet<PathBuf>, out: &mut Vec<PathBuf>) {
    let key = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
    if !visited.insert(key) {
        return;
    }
    let Ok(read_dir) = fs::read_dir(dir) else {
        tracing::debug!(dir = %dir.display(), "unable to read nbextensions directory");
        return;
    };
    let mut paths: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .collect();
    paths.sort();

    let mut subdirs = Vec::new();
    for path in paths {
        // `is_dir`/`is_file` follow symlinks.
        if path.is_dir() {
            let excluded = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| DEFAULT_EXCLUDED_DIRS.contains(&name));
            if !excluded {
                subdirs.push(path);
            }
        } else if path.is_file()
            && matches!(
                path.extension().and_then(|extension| extension.to_str()),
                Some("yaml" | "yml")
            )
        {
            out.push(path);
        }
    }
    for subdir in subdirs {
        collect_yaml_paths(&subdir, visited, out);
    }
}

fn load_descriptor_file(
    yaml_path: &Path,
    relative_url_base: &str,
) -> Result<ExtensionDescriptor, RegistryError> {
    let raw = fs::read_to_string(yaml_path).map_err(|error| {
        RegistryError::InvalidDescriptor(format!("failed to read yaml file: {error}"))
    })?;
    let parsed: serde_yaml::Value = serde_yaml::from_str(&raw).map_err(|error| {
        RegistryError::InvalidDescriptor(format!("failed to load yaml file: {error}"))
    })?;
    let spec = serde_json::to_value(parsed).map_err(|error| {
        RegistryError::InvalidDescriptor(format!("yaml is not JSON-compatible: {error}"))
    })?;
    process_descriptor_spec(spec, relative_url_base)
}

fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Validates a raw descriptor and fills in defaults and namespace-relative URLs.
pub fn process_descriptor_spec(
    spec: Value,
    relative_url_base: &str,
) -> Result<ExtensionDescriptor, RegistryError> {
    let Value::Object(mut spec) = spec else {
        return Err(RegistryError::InvalidDescriptor(
            "spec is not a mapping".to_string(),
        ));
    };
    let descriptor_type = spec
        .get("Type")
        .ok_or_else(|| RegistryError::InvalidDescriptor("spec has no Type key".to_string()))?;
    let descriptor_type = value_text(Some(descriptor_type));
    if !VALID_DESCRIPTOR_TYPES.contains(&descriptor_type.trim()) {
        return Err(RegistryError::InvalidDescriptor(format!(
            "spec has invalid value for Type key: {descriptor_type:?}"
        )));
    }
    if !spec.contains_key("Main") && !spec.contains_key("require") {
        return Err(RegistryError::InvalidDescriptor(
            "spec has neither \"Main\" nor \"require\" key".to_string(),
        ));
    }
    if !spec.contains_key("require") {
        let main = value_text(spec.get("Main"));
        spec.insert("require".to_string(), Value::String(strip_extension(&main)));
    }
    let require = spec.get("require").cloned().unwrap_or(Value::Null);
    set_default(&mut spec, "Name", require);
    set_default(&mut spec, "Compatibility", Value::from(DEFAULT_COMPATIBILITY));
    set_default(&mut spec, "Section", Value::from(DEFAULT_SECTION));

    for (from_key, to_key) in [("Link", "readme"), ("Icon", "icon"), ("Main", "require")] {
        let mut from_value = value_text(spec.get(to_key));
        if from_value.is_empty() {
            from_value = value_text(spec.get(from_key));
        }
        if from_value.is_empty() {
            continue;
        }
        let resolved = if absolute_url().is_match(&from_value) {
            from_value
        } else {
            normalize_url_path(&url_path_join(relative_url_base, &from_value))
        };
        spec.insert(to_key.to_string(), Value::String(resolved));
    }

    for key in ["require", "Name", "Section", "Compatibility"] {
        if let Some(value) = spec.get(key).filter(|value| !value.is_string()) {
            let text = value_text(Some(value));
            spec.insert(key.to_string(), Value::String(text));
        }
    }

    serde_json::from_value(Value::Object(spec))
        .map_err(|error| RegistryError::InvalidDescriptor(error.to_string()))
}

fn set_default(spec: &mut Map<String, Value>, key: &str, value: Value) {
    spec.entry(key.to_string()).or_insert(value);
}

fn strip_extension(path: &str) -> String {
    let file_start = path.rfind('/').map(|index| index + 1).unwrap_or(0);
    match path[file_start..].rfind('.') {
        Some(dot) if dot > 0 => path[..file_start + dot].to_string(),
        _ => path.to_string(),
    }
}

fn path_to_url(path: &Path) -> String {
    path.components()
        .filter_map(|component| component.as_os_str().to_str())
        .collect::<Vec<_>>()
        .join("/")
}

fn url_path_join(base: &str, tail: &str) -> String {
    let base = base.trim_end_matches('/');
    let tail = tail.trim_start_matches('/');
    match (base.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{base}/{tail}"),
    }
}

/// Collapses `.`, `..` and repeated slashes the way a posix path normalizer does.
pub(crate) fn normalize_url_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Deterministic text report of a discovery pass.
pub fn render_discovery_report(report: &DiscoveryReport) -> String {
    let roots: Vec<String> = report
        .roots
        .iter()
        .map(|root| root.display().to_string())
        .collect();
    let mut lines = vec![format!(
        "nbextension discovery: roots={} count={} invalid={}",
        if roots.is_empty() {
            "none".to_string()
        } else {
            roots.join(",")
        },
        report.entries.len(),
        report.invalid_entries.len()
    )];
    for entry in &report.entries {
        lines.push(format!(
            "nbextension: require={} section={} name={} duplicate={} yaml={}",
            entry.descriptor.require,
            entry.descriptor.section_or_default(),
            entry.descriptor.name.as_deref().unwrap_or(""),
            entry.descriptor.duplicate,
            entry.yaml_path.display()
        ));
    }
    for invalid in &report.invalid_entries {
        lines.push(format!(
            "invalid: yaml={} error={}",
            invalid.yaml_path.display(),
            invalid.error
        ));
    }
    lines.join("\n")
}
