use indexmap::IndexSet;
use std::path::Path;
use tracing::debug;

use crate::{
    context::{Context, Release},
    error::{GalaxyError, Result},
};

/// Collects the release files sitting directly in `dir` into `ctx` under
/// `namespace`. Subdirectories are not followed.
///
/// Files come back in lexical order, which keeps repeated runs over an
/// unchanged tree identical. The namespace is registered even when no file
/// matches.
pub fn inspect_dir(
    ctx: &mut Context,
    namespace: &str,
    dir: &Path,
    extensions: &IndexSet<String>,
) -> Result<()> {
    if !dir.is_dir() {
        return Err(GalaxyError::not_found(dir));
    }

    let pattern = format!("{}/*", glob::Pattern::escape(&dir.to_string_lossy()));
    let options = glob::MatchOptions {
        require_literal_leading_dot: true,
        ..Default::default()
    };
    let entries = glob::glob_with(&pattern, options)
        .map_err(|e| GalaxyError::config(format!("invalid directory pattern '{pattern}': {e}")))?;

    ctx.add_namespace(namespace);

    for entry in entries {
        let path = entry.map_err(|e| GalaxyError::Io {
            path: e.path().to_path_buf(),
            source: e.into_error(),
        })?;

        if !path.is_file() {
            continue;
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let Some(ext) = extensions.iter().find(|ext| name.ends_with(ext.as_str())) else {
            debug!(namespace, file = %name, "ignoring file with unknown extension");
            continue;
        };

        debug!(namespace, file = %name, "found release file");
        ctx.add_release(Release::from_path(namespace, &path, ext));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn exts(list: &[&str]) -> IndexSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn collects_only_matching_extensions() {
        let dir = tempfile::tempdir().unwrap();
        for f in ["b.yaml", "a.yaml", "notes.txt", "c.yaml"] {
            fs::write(dir.path().join(f), "").unwrap();
        }
        fs::create_dir(dir.path().join("nested.yaml")).unwrap();
        fs::write(dir.path().join("nested.yaml").join("deep.yaml"), "").unwrap();

        let mut ctx = Context::new();
        inspect_dir(&mut ctx, "app", dir.path(), &exts(&[".yaml"])).unwrap();

        let names: Vec<_> = ctx.releases("app").iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(ctx.releases("app").iter().all(|r| r.namespace == "app"));
    }

    #[test]
    fn hidden_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        for f in [".yaml", ".draft.yaml", "api.yaml"] {
            fs::write(dir.path().join(f), "").unwrap();
        }

        let mut ctx = Context::new();
        inspect_dir(&mut ctx, "app", dir.path(), &exts(&[".yaml"])).unwrap();

        let names: Vec<_> = ctx.releases("app").iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["api"]);
    }

    #[test]
    fn empty_directory_still_registers_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = Context::new();
        inspect_dir(&mut ctx, "empty", dir.path(), &exts(&[".yaml"])).unwrap();

        assert!(ctx.contains_namespace("empty"));
        assert!(ctx.releases("empty").is_empty());
    }

    #[test]
    fn missing_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("ghost");

        let mut ctx = Context::new();
        let err = inspect_dir(&mut ctx, "ghost", &missing, &exts(&[".yaml"])).unwrap_err();

        match err {
            GalaxyError::NotFound { path } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
        assert!(ctx.is_empty());
    }

    #[test]
    fn plain_file_is_not_a_namespace_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app");
        fs::write(&file, "").unwrap();

        let mut ctx = Context::new();
        assert!(matches!(
            inspect_dir(&mut ctx, "app", &file, &exts(&[".yaml"])),
            Err(GalaxyError::NotFound { .. })
        ));
    }
}
