pub mod applier;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod galaxy;
pub mod inspect;
pub mod plan;
pub mod report;
pub mod runtime;

pub use applier::{Applier, ApplierBuilder};
pub use config::{DotGalaxy, Environment, Namespaces, Spec, Transform};
pub use context::{Context, Release};
pub use error::GalaxyError;
pub use galaxy::{Data, Galaxy, Phase};
pub use plan::{NamespaceMap, Plan};
pub use runtime::Config;
