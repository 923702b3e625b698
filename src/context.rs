use indexmap::IndexMap;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One discovered release file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Release {
    /// Namespace the release belongs to (transformed once planned).
    pub namespace: String,

    /// Release identity: the file stem, minus any environment file suffix,
    /// plus the environment release prefix once planned.
    pub name: String,

    /// Source file. Never rewritten by planning.
    pub path: PathBuf,
}

impl Release {
    pub fn from_path(namespace: &str, path: &Path, extension: &str) -> Self {
        let file_name = file_name(path);
        let name = file_name
            .strip_suffix(extension)
            .unwrap_or(&file_name)
            .to_string();

        Self {
            namespace: namespace.to_string(),
            name,
            path: path.to_path_buf(),
        }
    }

    pub fn file_name(&self) -> String {
        file_name(&self.path)
    }
}

/// Releases grouped per namespace, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Context {
    releases: IndexMap<String, Vec<Release>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a namespace with no releases yet, keeping its position.
    pub fn add_namespace(&mut self, namespace: &str) {
        self.releases.entry(namespace.to_string()).or_default();
    }

    pub fn add_release(&mut self, release: Release) {
        self.releases
            .entry(release.namespace.clone())
            .or_default()
            .push(release);
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.releases.keys().map(String::as_str)
    }

    pub fn releases(&self, namespace: &str) -> &[Release] {
        self.releases
            .get(namespace)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Release])> {
        self.releases
            .iter()
            .map(|(ns, releases)| (ns.as_str(), releases.as_slice()))
    }

    pub fn contains_namespace(&self, namespace: &str) -> bool {
        self.releases.contains_key(namespace)
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
