use anyhow::{Context as _, Result};
use clap::Parser;
use std::{cell::RefCell, io, rc::Rc};
use tracing_subscriber::EnvFilter;

use galaxy::{
    applier::{ListingBuilder, ListingKind, SharedOut},
    cli::{Args, Command},
    DotGalaxy, Galaxy,
};

fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = args.to_config();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level)),
        )
        .with_writer(io::stderr)
        .init();
    tracing::debug!(config = %cfg.dot_galaxy_path.display(), dry_run = cfg.dry_run, "configuration");

    let dot_galaxy = DotGalaxy::load_from_path(&cfg.dot_galaxy_path).with_context(|| {
        format!(
            "parsing dot-galaxy file ('{}')",
            cfg.dot_galaxy_path.display()
        )
    })?;
    let mut g = Galaxy::new(dot_galaxy, cfg)?;

    match args.command {
        Command::Inspect => {
            g.inspect()?;
            print!("{}", galaxy::report::inspection(&g));
        }
        Command::Plan { output } => {
            g.plan()?;
            println!("{}", galaxy::report::build_report(&g, output)?);
        }
        Command::Apply(_) => {
            g.plan()?;
            let out: SharedOut = Rc::new(RefCell::new(io::stdout()));
            g.apply(
                &ListingBuilder::new(ListingKind::Secrets, Rc::clone(&out)),
                &ListingBuilder::new(ListingKind::Releases, out),
            )?;
        }
    }

    Ok(())
}
