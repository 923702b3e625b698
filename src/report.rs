use anyhow::Result;
use indexmap::IndexMap;
use serde_json::json;

use crate::{cli, galaxy::Galaxy};

pub fn build_report(g: &Galaxy, format: cli::OutputFormat) -> Result<String> {
    match format {
        cli::OutputFormat::Text => Ok(summary(g)),
        cli::OutputFormat::Json => json_report(g),
    }
}

fn summary(g: &Galaxy) -> String {
    let mut out = String::new();

    out.push_str("galaxy plan\n");
    out.push_str("===========\n");
    out.push_str(&format!("dry_run: {}\n", g.config().dry_run));

    if g.modified().is_empty() {
        out.push_str("\nnothing to apply\n");
        return out;
    }

    for (env, contexts) in g.modified() {
        out.push_str(&format!("\nenvironment: {env}\n"));

        let Some(map) = g.original_namespaces(env) else {
            continue;
        };
        if map.is_empty() {
            out.push_str("  (no namespaces)\n");
            continue;
        }

        for (ns, original) in map.iter() {
            out.push_str(&format!("  namespace: {ns} (from {original})\n"));
            let releases = contexts.iter().flat_map(|ctx| ctx.releases(ns));
            let mut any = false;
            for r in releases {
                any = true;
                out.push_str(&format!("    - {} <- {}\n", r.name, r.path.display()));
            }
            if !any {
                out.push_str("    (no releases)\n");
            }
        }
    }

    out
}

fn json_report(g: &Galaxy) -> Result<String> {
    let value = json!({
        "dryRun": g.config().dry_run,
        "modified": g.modified(),
        "originalNamespaces": g
            .modified()
            .keys()
            .map(|env| (env.as_str(), g.original_namespaces(env)))
            .collect::<IndexMap<_, _>>(),
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Lists what [`Galaxy::inspect`] found, per environment and namespace.
pub fn inspection(g: &Galaxy) -> String {
    let mut out = String::new();

    out.push_str("galaxy inspect\n");
    out.push_str("==============\n");
    for (env, contexts) in g.original() {
        out.push_str(&format!("\nenvironment: {env}\n"));
        for ctx in contexts {
            for (ns, releases) in ctx.iter() {
                out.push_str(&format!("  namespace: {ns} ({} files)\n", releases.len()));
                for r in releases {
                    out.push_str(&format!("    - {}\n", r.file_name()));
                }
            }
        }
    }

    out
}
