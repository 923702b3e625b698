use anyhow::{bail, Result};
use std::{cell::RefCell, io::Write, rc::Rc};
use tracing::info;

use crate::{
    config::Environment,
    context::{Context, Release},
    runtime::Config,
};

/// Capability handed to external appliers (secrets, releases).
///
/// Called once per planned namespace: `bootstrap` then `apply`.
pub trait Applier {
    fn bootstrap(&mut self, namespace: &str, original_namespace: &str, dry_run: bool) -> Result<()>;

    fn apply(&mut self) -> Result<()>;
}

/// Builds an applier for one environment out of its planned contexts.
pub trait ApplierBuilder {
    fn build(
        &self,
        env: &Environment,
        planned: &[Context],
        cfg: &Config,
    ) -> Result<Box<dyn Applier>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Secrets,
    Releases,
}

impl ListingKind {
    fn label(self) -> &'static str {
        match self {
            ListingKind::Secrets => "secrets",
            ListingKind::Releases => "release",
        }
    }
}

pub type SharedOut = Rc<RefCell<dyn Write>>;

/// Writes what would be applied instead of talking to a cluster.
pub struct ListingApplier {
    kind: ListingKind,
    env: String,
    planned: Vec<Context>,
    out: SharedOut,
    pending: Option<Pending>,
}

struct Pending {
    namespace: String,
    original_namespace: String,
    dry_run: bool,
    releases: Vec<Release>,
}

impl ListingApplier {
    pub fn new(kind: ListingKind, env: &str, planned: Vec<Context>, out: SharedOut) -> Self {
        Self {
            kind,
            env: env.to_string(),
            planned,
            out,
            pending: None,
        }
    }
}

impl Applier for ListingApplier {
    fn bootstrap(&mut self, namespace: &str, original_namespace: &str, dry_run: bool) -> Result<()> {
        let releases: Vec<Release> = self
            .planned
            .iter()
            .flat_map(|ctx| ctx.releases(namespace).iter().cloned())
            .collect();

        if !self.planned.iter().any(|ctx| ctx.contains_namespace(namespace)) {
            bail!(
                "{}: namespace '{namespace}' is not part of the plan for '{}'",
                self.kind.label(),
                self.env
            );
        }

        self.pending = Some(Pending {
            namespace: namespace.to_string(),
            original_namespace: original_namespace.to_string(),
            dry_run,
            releases,
        });
        Ok(())
    }

    fn apply(&mut self) -> Result<()> {
        let Some(p) = self.pending.take() else {
            bail!("{}: apply called before bootstrap", self.kind.label());
        };

        let mode = if p.dry_run { " (dry-run)" } else { "" };
        let mut out = self.out.borrow_mut();

        match self.kind {
            ListingKind::Secrets => {
                info!(env = %self.env, namespace = %p.namespace, "secrets handled");
                writeln!(
                    out,
                    "[{}] secrets for namespace '{}'{mode}",
                    self.env, p.namespace
                )?;
            }
            ListingKind::Releases => {
                for r in &p.releases {
                    info!(
                        env = %self.env,
                        namespace = %p.namespace,
                        release = %r.name,
                        "release planned"
                    );
                    writeln!(
                        out,
                        "[{}] {}/{} <- {}/{}{mode}",
                        self.env,
                        p.namespace,
                        r.name,
                        p.original_namespace,
                        r.file_name()
                    )?;
                }
            }
        }
        Ok(())
    }
}

/// Builds a [`ListingApplier`] of the given kind writing to `out`.
pub struct ListingBuilder {
    kind: ListingKind,
    out: SharedOut,
}

impl ListingBuilder {
    pub fn new(kind: ListingKind, out: SharedOut) -> Self {
        Self { kind, out }
    }
}

impl ApplierBuilder for ListingBuilder {
    fn build(
        &self,
        env: &Environment,
        planned: &[Context],
        _cfg: &Config,
    ) -> Result<Box<dyn Applier>> {
        Ok(Box::new(ListingApplier::new(
            self.kind,
            &env.name,
            planned.to_vec(),
            Rc::clone(&self.out),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn planned() -> Vec<Context> {
        let mut ctx = Context::new();
        ctx.add_release(Release {
            namespace: "app-prod".into(),
            name: "p-redis".into(),
            path: Path::new("/base/app/redis-prod.yaml").to_path_buf(),
        });
        vec![ctx]
    }

    fn buffer() -> (Rc<RefCell<Vec<u8>>>, SharedOut) {
        let buf = Rc::new(RefCell::new(Vec::new()));
        let out: SharedOut = buf.clone();
        (buf, out)
    }

    #[test]
    fn lists_releases_of_bootstrapped_namespace() {
        let (buf, out) = buffer();
        let mut a = ListingApplier::new(ListingKind::Releases, "prod", planned(), out);

        a.bootstrap("app-prod", "app", true).unwrap();
        a.apply().unwrap();

        let text = String::from_utf8(buf.borrow().clone()).unwrap();
        assert_eq!(
            text,
            "[prod] app-prod/p-redis <- app/redis-prod.yaml (dry-run)\n"
        );
    }

    #[test]
    fn unknown_namespace_fails_bootstrap() {
        let (_, out) = buffer();
        let mut a = ListingApplier::new(ListingKind::Secrets, "prod", planned(), out);
        assert!(a.bootstrap("ghost", "ghost", false).is_err());
    }

    #[test]
    fn apply_requires_bootstrap() {
        let (_, out) = buffer();
        let mut a = ListingApplier::new(ListingKind::Secrets, "prod", planned(), out);
        assert!(a.apply().is_err());
    }
}
