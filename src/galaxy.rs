use indexmap::IndexMap;
use tracing::{debug, info, info_span};

use crate::{
    applier::ApplierBuilder,
    config::DotGalaxy,
    context::Context,
    error::{GalaxyError, Result},
    inspect::inspect_dir,
    plan::{NamespaceMap, Plan},
    runtime::Config,
};

/// Contexts per environment name.
pub type Data = IndexMap<String, Vec<Context>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninspected,
    Inspected,
    Planned,
    Applied,
}

/// Owns the manifest, the run configuration and everything planned from them.
#[derive(Debug)]
pub struct Galaxy {
    dot_galaxy: DotGalaxy,
    cfg: Config,
    phase: Phase,
    original: Data,
    modified: Data,
    env_original_ns: IndexMap<String, NamespaceMap>,
}

impl Galaxy {
    pub fn new(mut dot_galaxy: DotGalaxy, cfg: Config) -> Result<Self> {
        dot_galaxy.normalize();
        dot_galaxy.validate()?;
        Ok(Self {
            dot_galaxy,
            cfg,
            phase: Phase::Uninspected,
            original: Data::new(),
            modified: Data::new(),
            env_original_ns: IndexMap::new(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn dot_galaxy(&self) -> &DotGalaxy {
        &self.dot_galaxy
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Contexts discovered by [`Galaxy::inspect`].
    pub fn original(&self) -> &Data {
        &self.original
    }

    /// Contexts produced by [`Galaxy::plan`].
    pub fn modified(&self) -> &Data {
        &self.modified
    }

    pub fn planned(&self, env: &str) -> Option<&[Context]> {
        self.modified.get(env).map(Vec::as_slice)
    }

    pub fn original_namespaces(&self, env: &str) -> Option<&NamespaceMap> {
        self.env_original_ns.get(env)
    }

    /// Inspects every namespace directory once per environment.
    pub fn inspect(&mut self) -> Result<()> {
        let _span = info_span!("inspect").entered();

        let base_dir = &self.dot_galaxy.spec.namespaces.base_dir;
        if !base_dir.is_dir() {
            return Err(GalaxyError::not_found(base_dir));
        }

        self.original.clear();
        for env in self.dot_galaxy.list_environments() {
            let ctx = base_context(&self.dot_galaxy, env)?;
            self.original.entry(env.to_string()).or_default().push(ctx);
        }

        if self.phase == Phase::Uninspected {
            self.phase = Phase::Inspected;
        }
        Ok(())
    }

    /// Plans the requested environments, or all of them when none is requested.
    /// Previous planned data is discarded first.
    pub fn plan(&mut self) -> Result<()> {
        let requested = self.cfg.get_environments();
        let namespaces = self.cfg.get_namespaces();
        let _span = info_span!("plan", dry_run = self.cfg.dry_run).entered();
        info!(?namespaces, environments = ?requested, "planning");

        self.check_requested(&requested, &namespaces)?;

        self.modified.clear();
        self.env_original_ns.clear();

        for env_name in self.dot_galaxy.list_environments() {
            if !requested.is_empty() && !requested.iter().any(|r| r == env_name) {
                info!(env = env_name, "skipping environment");
                continue;
            }

            let env = self.dot_galaxy.get_environment(env_name)?;
            let ctx = base_context(&self.dot_galaxy, env_name)?;

            info!(env = env_name, "planning environment");
            let (modified, original_ns) =
                Plan::new(env, &namespaces, &ctx).context_for_environment()?;

            debug!(
                env = env_name,
                namespaces = modified.len(),
                "environment planned"
            );
            self.env_original_ns
                .insert(env_name.to_string(), original_ns);
            self.modified
                .entry(env_name.to_string())
                .or_default()
                .push(modified);
        }

        self.phase = Phase::Planned;
        Ok(())
    }

    /// Applies the single requested environment, namespace by namespace:
    /// secrets first (unless skipped), then releases. Nothing is rolled back
    /// when an applier fails half way.
    pub fn apply(
        &mut self,
        secrets: &dyn ApplierBuilder,
        releases: &dyn ApplierBuilder,
    ) -> Result<()> {
        let dry_run = self.cfg.dry_run;
        let env_name = self.probe_single_env()?;
        let _span = info_span!("apply", env = %env_name, dry_run).entered();
        info!("applying changes for environment");

        let env = self.dot_galaxy.get_environment(&env_name)?;
        let planned = self.modified[&env_name].as_slice();

        let mut vault = if self.cfg.skip_secrets {
            None
        } else {
            Some(secrets.build(env, planned, &self.cfg)?)
        };
        let mut landscaper = releases.build(env, planned, &self.cfg)?;

        for (ns, original_ns) in self.env_original_ns[&env_name].iter() {
            if let Some(v) = vault.as_mut() {
                info!(namespace = ns, "handling secrets");
                v.bootstrap(ns, original_ns, dry_run)?;
                v.apply()?;
            }

            info!(namespace = ns, original = original_ns, "handling namespace");
            landscaper.bootstrap(ns, original_ns, dry_run)?;
            landscaper.apply()?;
        }

        self.phase = Phase::Applied;
        Ok(())
    }

    /// Makes sure exactly one environment is requested and that it has been planned.
    pub fn probe_single_env(&self) -> Result<String> {
        let envs = self.cfg.get_environments();
        let [env] = envs.as_slice() else {
            return Err(GalaxyError::config(format!(
                "a single environment must be informed, got {}",
                envs.len()
            )));
        };

        debug!(env = %env, "checking planned data");
        if !self.modified.contains_key(env) {
            return Err(GalaxyError::NotPlanned {
                env: env.clone(),
                what: "planned data",
            });
        }
        if !self.env_original_ns.contains_key(env) {
            return Err(GalaxyError::NotPlanned {
                env: env.clone(),
                what: "original namespace names map",
            });
        }

        Ok(env.clone())
    }

    fn check_requested(&self, envs: &[String], namespaces: &[String]) -> Result<()> {
        let known = self.dot_galaxy.environments_by_name();
        if let Some(unknown) = envs.iter().find(|e| !known.contains_key(e.as_str())) {
            return Err(GalaxyError::config(format!(
                "environment is not found: {unknown}"
            )));
        }

        let declared = self.dot_galaxy.list_namespaces();
        if let Some(unknown) = namespaces.iter().find(|ns| !declared.contains(ns)) {
            return Err(GalaxyError::config(format!(
                "namespace informed does not exist: {unknown}"
            )));
        }
        Ok(())
    }
}

/// Fresh context for one environment pass over every declared namespace.
fn base_context(dot_galaxy: &DotGalaxy, env: &str) -> Result<Context> {
    let exts = &dot_galaxy.spec.namespaces.extensions;
    let mut ctx = Context::new();

    for ns in dot_galaxy.list_namespaces() {
        let dir = dot_galaxy.namespace_dir(ns)?;
        info!(env, namespace = %ns, dir = %dir.display(), "inspecting namespace");
        inspect_dir(&mut ctx, ns, &dir, exts)?;
    }
    Ok(ctx)
}
