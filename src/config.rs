use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use crate::error::{GalaxyError, Result};

pub const DEFAULT_CONFIG_PATH: &str = ".galaxy.yaml";

/// The `.galaxy.yaml` manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DotGalaxy {
    #[serde(rename = "galaxy")]
    pub spec: Spec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Spec {
    #[serde(default)]
    pub environments: Vec<Environment>,

    pub namespaces: Namespaces,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub name: String,

    #[serde(default)]
    pub skip_on_namespaces: IndexSet<String>,

    #[serde(default)]
    pub file_suffixes: Vec<String>,

    #[serde(default)]
    pub transform: Transform,
}

/// How names are rewritten when a namespace is planned for an environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    #[serde(default)]
    pub namespace_suffix: String,

    #[serde(default)]
    pub release_prefix: String,
}

/// Where namespace directories live and which files in them are releases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespaces {
    pub base_dir: PathBuf,

    #[serde(default = "default_extensions")]
    pub extensions: IndexSet<String>,

    #[serde(default)]
    pub names: Vec<String>,
}

fn default_extensions() -> IndexSet<String> {
    [".yaml", ".yml"].into_iter().map(String::from).collect()
}

impl DotGalaxy {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            GalaxyError::config(format!("reading '{}': {e}", path.display()))
        })?;

        let is_toml = path.extension().is_some_and(|ext| ext == "toml");
        let mut dot: Self = if is_toml {
            toml::from_str(&text)
                .map_err(|e| GalaxyError::config(format!("parsing '{}': {e}", path.display())))?
        } else {
            serde_yaml::from_str(&text)
                .map_err(|e| GalaxyError::config(format!("parsing '{}': {e}", path.display())))?
        };

        dot.normalize();
        dot.validate()?;
        Ok(dot)
    }

    /// Extensions are matched as file-name suffixes, so `yaml` becomes `.yaml`.
    pub fn normalize(&mut self) {
        self.spec.namespaces.extensions = self
            .spec
            .namespaces
            .extensions
            .iter()
            .map(|ext| ext.trim())
            .filter(|ext| !ext.is_empty())
            .map(|ext| {
                if ext.starts_with('.') {
                    ext.to_string()
                } else {
                    format!(".{ext}")
                }
            })
            .collect();
    }

    pub fn validate(&self) -> Result<()> {
        let names = &self.spec.namespaces.names;
        if names.is_empty() {
            return Err(GalaxyError::config("namespaces.names must not be empty"));
        }

        let mut seen = IndexSet::new();
        for ns in names {
            if !is_dns_label(ns) {
                return Err(GalaxyError::config(format!(
                    "namespace '{ns}' is not a valid kubernetes namespace name"
                )));
            }
            if !seen.insert(ns.as_str()) {
                return Err(GalaxyError::config(format!(
                    "namespace '{ns}' is declared more than once"
                )));
            }
        }

        let mut seen = IndexSet::new();
        for env in &self.spec.environments {
            if env.name.trim().is_empty() {
                return Err(GalaxyError::config("environment name must not be empty"));
            }
            if !seen.insert(env.name.as_str()) {
                return Err(GalaxyError::config(format!(
                    "environment '{}' is declared more than once",
                    env.name
                )));
            }

            let suffix = &env.transform.namespace_suffix;
            if let Some(ns) = names
                .iter()
                .find(|ns| !is_dns_label(&format!("{ns}{suffix}")))
            {
                return Err(GalaxyError::config(format!(
                    "environment '{}': namespace suffix '{suffix}' turns '{ns}' into an invalid namespace name",
                    env.name
                )));
            }
        }

        Ok(())
    }

    pub fn list_namespaces(&self) -> &[String] {
        &self.spec.namespaces.names
    }

    pub fn list_environments(&self) -> Vec<&str> {
        self.spec
            .environments
            .iter()
            .map(|env| env.name.as_str())
            .collect()
    }

    /// Environments indexed by name. Duplicates are rejected by `validate`.
    pub fn environments_by_name(&self) -> IndexMap<&str, &Environment> {
        self.spec
            .environments
            .iter()
            .map(|env| (env.name.as_str(), env))
            .collect()
    }

    pub fn get_environment(&self, name: &str) -> Result<&Environment> {
        self.environments_by_name()
            .get(name)
            .copied()
            .ok_or_else(|| GalaxyError::config(format!("environment is not found: {name}")))
    }

    pub fn namespace_dir(&self, name: &str) -> Result<PathBuf> {
        if !self.spec.namespaces.names.iter().any(|ns| ns == name) {
            return Err(GalaxyError::config(format!(
                "namespace informed does not exist: {name}"
            )));
        }
        let base = &self.spec.namespaces.base_dir;
        if !base.is_dir() {
            return Err(GalaxyError::not_found(base));
        }
        Ok(base.join(name))
    }
}

fn is_dns_label(s: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("static namespace regex")
    });
    s.len() <= 63 && re.is_match(s)
}
