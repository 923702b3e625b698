use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;

/// Run configuration: what to plan and how to apply it.
#[derive(Debug, Clone)]
pub struct Config {
    pub dot_galaxy_path: PathBuf,
    pub dry_run: bool,
    /// Comma separated environment names; empty means all declared.
    pub environments: String,
    /// Comma separated namespace names; empty means all declared.
    pub namespaces: String,
    pub log_level: String,
    pub skip_secrets: bool,

    pub kubernetes: KubernetesConfig,
    pub landscaper: LandscaperConfig,
    pub vault_handler: VaultHandlerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dot_galaxy_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            dry_run: false,
            environments: String::new(),
            namespaces: String::new(),
            log_level: "error".to_string(),
            skip_secrets: false,
            kubernetes: KubernetesConfig::default(),
            landscaper: LandscaperConfig::default(),
            vault_handler: VaultHandlerConfig::default(),
        }
    }
}

impl Config {
    pub fn get_environments(&self) -> Vec<String> {
        split_list(&self.environments)
    }

    pub fn get_namespaces(&self) -> Vec<String> {
        split_list(&self.namespaces)
    }
}

// Pass-through blocks below are only ever handed to applier builders.

#[derive(Debug, Clone, Default)]
pub struct KubernetesConfig {
    pub in_cluster: bool,
    pub kube_config: String,
    pub kube_context: String,
}

#[derive(Debug, Clone, Default)]
pub struct LandscaperConfig {
    pub disabled_stages: String,
    pub override_file: String,
    pub helm_home: String,
    pub tiller_namespace: String,
    pub tiller_port: u16,
    pub tiller_timeout: i64,
    pub wait_for_resources: bool,
    pub wait_timeout: i64,
}

#[derive(Debug, Clone, Default)]
pub struct VaultHandlerConfig {
    pub vault_addr: String,
    pub vault_token: String,
    pub vault_role_id: String,
    pub vault_secret_id: String,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
