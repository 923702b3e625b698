use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::runtime::{Config, KubernetesConfig, LandscaperConfig, VaultHandlerConfig};

/// Galaxy is a GitOps repository manager: it plans releases and secrets per
/// environment and hands them to the appliers.
#[derive(Parser, Debug)]
#[command(name = "galaxy", version, about)]
pub struct Args {
    /// Alternative Galaxy manifest file
    #[arg(long, global = true, env = "GALAXY_CONFIG", default_value = crate::config::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Dry-run mode
    #[arg(long, global = true, env = "GALAXY_DRY_RUN", default_value_t = false)]
    pub dry_run: bool,

    /// Logging level (RUST_LOG takes precedence)
    #[arg(long, global = true, env = "GALAXY_LOG_LEVEL", default_value = "error")]
    pub log_level: String,

    /// Target environments, comma separated list
    #[arg(long, global = true, env = "GALAXY_ENVIRONMENT", default_value = "")]
    pub environment: String,

    /// Target namespaces, comma separated list
    #[arg(long, global = true, env = "GALAXY_NAMESPACE", default_value = "")]
    pub namespace: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print what was discovered in the namespace directories
    Inspect,

    /// Plan environments and print the result
    Plan {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Plan and apply a single environment
    Apply(ApplyArgs),
}

#[derive(ClapArgs, Debug, Default)]
pub struct ApplyArgs {
    /// Do not handle secrets
    #[arg(long, env = "GALAXY_SKIP_SECRETS", default_value_t = false)]
    pub skip_secrets: bool,

    /// Use in-cluster Kubernetes configuration
    #[arg(long, env = "GALAXY_IN_CLUSTER", default_value_t = false)]
    pub in_cluster: bool,

    #[arg(long, env = "GALAXY_KUBE_CONFIG", default_value = "")]
    pub kube_config: String,

    #[arg(long, env = "GALAXY_KUBE_CONTEXT", default_value = "")]
    pub kube_context: String,

    /// Landscaper stages to disable, comma separated
    #[arg(long = "disable", env = "GALAXY_DISABLE", default_value = "")]
    pub disabled_stages: String,

    #[arg(long, env = "GALAXY_OVERRIDE_FILE", default_value = "")]
    pub override_file: String,

    #[arg(long, env = "GALAXY_HELM_HOME", default_value = "")]
    pub helm_home: String,

    #[arg(long, env = "GALAXY_TILLER_NAMESPACE", default_value = "kube-system")]
    pub tiller_namespace: String,

    #[arg(long, env = "GALAXY_TILLER_PORT", default_value_t = 44134)]
    pub tiller_port: u16,

    #[arg(long, env = "GALAXY_TILLER_TIMEOUT", default_value_t = 30)]
    pub tiller_timeout: i64,

    /// Wait for resources to become ready
    #[arg(long = "wait", env = "GALAXY_WAIT", default_value_t = false)]
    pub wait_for_resources: bool,

    #[arg(long, env = "GALAXY_WAIT_TIMEOUT", default_value_t = 120)]
    pub wait_timeout: i64,

    #[arg(long, env = "GALAXY_VAULT_ADDR", default_value = "")]
    pub vault_addr: String,

    #[arg(long, env = "GALAXY_VAULT_TOKEN", default_value = "", hide_env_values = true)]
    pub vault_token: String,

    #[arg(long, env = "GALAXY_VAULT_ROLE_ID", default_value = "")]
    pub vault_role_id: String,

    #[arg(long, env = "GALAXY_VAULT_SECRET_ID", default_value = "", hide_env_values = true)]
    pub vault_secret_id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Args {
    /// Run configuration for the library; apply-only settings stay at their
    /// defaults for the other subcommands.
    pub fn to_config(&self) -> Config {
        let default_apply = ApplyArgs::default();
        let apply = match &self.command {
            Command::Apply(a) => a,
            _ => &default_apply,
        };

        Config {
            dot_galaxy_path: self.config.clone(),
            dry_run: self.dry_run,
            environments: self.environment.clone(),
            namespaces: self.namespace.clone(),
            log_level: self.log_level.clone(),
            skip_secrets: apply.skip_secrets,
            kubernetes: KubernetesConfig {
                in_cluster: apply.in_cluster,
                kube_config: apply.kube_config.clone(),
                kube_context: apply.kube_context.clone(),
            },
            landscaper: LandscaperConfig {
                disabled_stages: apply.disabled_stages.clone(),
                override_file: apply.override_file.clone(),
                helm_home: expand_home(&apply.helm_home),
                tiller_namespace: apply.tiller_namespace.clone(),
                tiller_port: apply.tiller_port,
                tiller_timeout: apply.tiller_timeout,
                wait_for_resources: apply.wait_for_resources,
                wait_timeout: apply.wait_timeout,
            },
            vault_handler: VaultHandlerConfig {
                vault_addr: apply.vault_addr.clone(),
                vault_token: apply.vault_token.clone(),
                vault_role_id: apply.vault_role_id.clone(),
                vault_secret_id: apply.vault_secret_id.clone(),
            },
        }
    }
}

/// Expands a leading `~/` to the home directory, then `$VAR` and `${VAR}`
/// from the process environment. Unset variables expand to nothing.
fn expand_home(raw: &str) -> String {
    let raw = match (raw.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest).to_string_lossy().to_string(),
        _ => raw.to_string(),
    };
    expand_env(&raw, |key| std::env::var(key).ok())
}

fn expand_env(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    if !input.contains('$') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) if end > 0 => {
                    out.push_str(&lookup(&braced[..end]).unwrap_or_default());
                    rest = &braced[end + 1..];
                }
                // `${}` or an unclosed brace: keep it as written
                _ => {
                    out.push('$');
                    rest = after;
                }
            }
            continue;
        }

        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if len == 0 {
            out.push('$');
        } else {
            out.push_str(&lookup(&after[..len]).unwrap_or_default());
        }
        rest = &after[len..];
    }

    out.push_str(rest);
    out
}
