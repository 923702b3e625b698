use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::{
    config::Environment,
    context::{Context, Release},
    error::{GalaxyError, Result},
};

/// Transformed namespace name to the original one, in planning order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NamespaceMap(IndexMap<String, String>);

impl NamespaceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `transformed -> original`. A second original claiming the same
    /// transformed name is a conflict for environment `env`.
    pub fn record(&mut self, env: &str, transformed: &str, original: &str) -> Result<()> {
        match self.0.get(transformed) {
            Some(existing) if existing != original => Err(GalaxyError::Conflict {
                env: env.to_string(),
                transformed: transformed.to_string(),
                first: existing.clone(),
                second: original.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.0.insert(transformed.to_string(), original.to_string());
                Ok(())
            }
        }
    }

    pub fn original(&self, transformed: &str) -> Option<&str> {
        self.0.get(transformed).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Rewrites a base context for one environment.
///
/// `namespaces` is the requested namespace scope; empty means every
/// namespace in the base context.
#[derive(Debug, Clone, Copy)]
pub struct Plan<'a> {
    env: &'a Environment,
    namespaces: &'a [String],
    ctx: &'a Context,
}

impl<'a> Plan<'a> {
    pub fn new(env: &'a Environment, namespaces: &'a [String], ctx: &'a Context) -> Self {
        Self {
            env,
            namespaces,
            ctx,
        }
    }

    pub fn context_for_environment(&self) -> Result<(Context, NamespaceMap)> {
        let mut modified = Context::new();
        let mut original_ns = NamespaceMap::new();
        let transform = &self.env.transform;

        for (ns, releases) in self.ctx.iter() {
            if !self.namespaces.is_empty() && !self.namespaces.iter().any(|n| n == ns) {
                debug!(env = %self.env.name, namespace = ns, "namespace not requested");
                continue;
            }
            if self.env.skip_on_namespaces.contains(ns) {
                debug!(env = %self.env.name, namespace = ns, "namespace skipped on environment");
                continue;
            }

            let target_ns = format!("{ns}{}", transform.namespace_suffix);
            original_ns.record(&self.env.name, &target_ns, ns)?;
            modified.add_namespace(&target_ns);

            for release in releases {
                let Some(name) = self.select(&release.name) else {
                    continue;
                };

                modified.add_release(Release {
                    namespace: target_ns.clone(),
                    name: format!("{}{name}", transform.release_prefix),
                    path: release.path.clone(),
                });
            }
        }

        Ok((modified, original_ns))
    }

    /// Returns the release identity to plan, or `None` when the release is not
    /// meant for this environment. Suffixes are tried in configured order and
    /// the first one matching is stripped from the identity.
    fn select<'n>(&self, name: &'n str) -> Option<&'n str> {
        if self.env.file_suffixes.is_empty() {
            return Some(name);
        }
        self.env
            .file_suffixes
            .iter()
            .find_map(|suffix| {
                name.strip_suffix(suffix.as_str())
                    .filter(|stripped| !stripped.is_empty())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Transform;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn base() -> Context {
        let mut ctx = Context::new();
        for (ns, file) in [
            ("app", "myrelease.yaml"),
            ("app", "redis-prod.yaml"),
            ("app", "redis-dev.yaml"),
            ("internal", "vault.yaml"),
            ("web", "frontend-prod.yaml"),
        ] {
            let path = Path::new("/base").join(ns).join(file);
            ctx.add_release(Release::from_path(ns, &path, ".yaml"));
        }
        ctx
    }

    fn env(name: &str) -> Environment {
        Environment {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn names(ctx: &Context, ns: &str) -> Vec<String> {
        ctx.releases(ns).iter().map(|r| r.name.clone()).collect()
    }

    #[test]
    fn identity_transform_keeps_context() {
        let ctx = base();
        let e = env("dev");
        let (modified, map) = Plan::new(&e, &[], &ctx).context_for_environment().unwrap();

        assert_eq!(modified, ctx);
        assert_eq!(
            map.iter().collect::<Vec<_>>(),
            vec![("app", "app"), ("internal", "internal"), ("web", "web")]
        );
    }

    #[test]
    fn applies_namespace_suffix_and_release_prefix() {
        let ctx = base();
        let mut e = env("prod");
        e.transform = Transform {
            namespace_suffix: "-prod".into(),
            release_prefix: "x-".into(),
        };

        let (modified, map) = Plan::new(&e, &[], &ctx).context_for_environment().unwrap();

        assert!(!modified.contains_namespace("app"));
        assert_eq!(names(&modified, "app-prod")[0], "x-myrelease");
        assert_eq!(map.original("app-prod"), Some("app"));

        let r = &modified.releases("app-prod")[0];
        assert_eq!(r.namespace, "app-prod");
        assert_eq!(r.path, Path::new("/base/app/myrelease.yaml"));
    }

    #[test]
    fn skipped_namespace_has_no_entry() {
        let ctx = base();
        let mut e = env("staging");
        e.skip_on_namespaces.insert("internal".into());

        let (modified, map) = Plan::new(&e, &[], &ctx).context_for_environment().unwrap();

        assert!(!modified.contains_namespace("internal"));
        assert_eq!(map.original("internal"), None);
        assert!(modified.contains_namespace("app"));
        assert!(modified.contains_namespace("web"));
    }

    #[test]
    fn namespace_filter_limits_scope() {
        let ctx = base();
        let e = env("dev");
        let only = vec!["web".to_string()];

        let (modified, map) = Plan::new(&e, &only, &ctx).context_for_environment().unwrap();

        assert_eq!(modified.namespaces().collect::<Vec<_>>(), vec!["web"]);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn file_suffixes_select_and_strip() {
        let ctx = base();
        let mut e = env("prod");
        e.file_suffixes = vec!["-prod".into()];

        let (modified, _) = Plan::new(&e, &[], &ctx).context_for_environment().unwrap();

        assert_eq!(names(&modified, "app"), vec!["redis"]);
        assert_eq!(names(&modified, "web"), vec!["frontend"]);
        // no matching file, but the namespace itself is still planned
        assert!(modified.contains_namespace("internal"));
        assert!(modified.releases("internal").is_empty());
    }

    #[test]
    fn first_listed_suffix_wins() {
        let mut ctx = Context::new();
        ctx.add_release(Release::from_path(
            "app",
            Path::new("/base/app/api-eu-prod.yaml"),
            ".yaml",
        ));

        let mut e = env("prod");
        e.file_suffixes = vec!["-eu-prod".into(), "-prod".into()];
        let (modified, _) = Plan::new(&e, &[], &ctx).context_for_environment().unwrap();
        assert_eq!(names(&modified, "app"), vec!["api"]);

        e.file_suffixes = vec!["-prod".into(), "-eu-prod".into()];
        let (modified, _) = Plan::new(&e, &[], &ctx).context_for_environment().unwrap();
        assert_eq!(names(&modified, "app"), vec!["api-eu"]);
    }

    #[test]
    fn suffix_consuming_whole_name_falls_through() {
        let mut ctx = Context::new();
        for file in ["eu-prod.yaml", "prod.yaml"] {
            let path = Path::new("/base/app").join(file);
            ctx.add_release(Release::from_path("app", &path, ".yaml"));
        }

        let mut e = env("prod");
        e.file_suffixes = vec!["eu-prod".into(), "-prod".into()];
        let (modified, _) = Plan::new(&e, &[], &ctx).context_for_environment().unwrap();

        assert_eq!(names(&modified, "app"), vec!["eu"]);
    }

    #[test]
    fn everything_skipped_yields_empty_context() {
        let ctx = base();
        let mut e = env("none");
        for ns in ["app", "internal", "web"] {
            e.skip_on_namespaces.insert(ns.into());
        }

        let (modified, map) = Plan::new(&e, &[], &ctx).context_for_environment().unwrap();
        assert!(modified.is_empty());
        assert!(map.is_empty());
    }

    #[test]
    fn colliding_transformed_names_conflict() {
        let mut map = NamespaceMap::new();
        map.record("prod", "app-prod", "app").unwrap();
        map.record("prod", "app-prod", "app").unwrap();

        let err = map.record("prod", "app-prod", "app-prod").unwrap_err();
        match err {
            GalaxyError::Conflict {
                env,
                transformed,
                first,
                second,
            } => {
                assert_eq!(env, "prod");
                assert_eq!(transformed, "app-prod");
                assert_eq!(first, "app");
                assert_eq!(second, "app-prod");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(map.original("app-prod"), Some("app"));
    }

    #[test]
    fn planning_is_deterministic() {
        let ctx = base();
        let mut e = env("prod");
        e.file_suffixes = vec!["-prod".into()];
        e.transform.namespace_suffix = "-prod".into();
        e.transform.release_prefix = "p-".into();

        let first = Plan::new(&e, &[], &ctx).context_for_environment().unwrap();
        let second = Plan::new(&e, &[], &ctx).context_for_environment().unwrap();

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(first, second);
    }
}
