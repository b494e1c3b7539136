//! pkgscope CLI: search, resolve and inspect packaged binary components.

mod config;
mod serve;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pkgscope_analysis::{AnalysisCache, AnalysisService, ManifestAnalyzer};
use pkgscope_core::SystemClock;
use pkgscope_registry::{CachingRegistry, LocalRegistry};
use pkgscope_tools::{
    AnalyzeAllArgs, ArtifactArgs, ListTypeMembersArgs, PackageArgs, PackageVersionArgs,
    SearchPackagesArgs, SearchTypesArgs, ToolCall, Toolbox,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use config::Config;

#[derive(Parser)]
#[command(name = "pkgscope", version, about = "Inspect the public surface of packaged binaries")]
struct Cli {
    /// Local registry directory (overrides pkgscope.toml)
    #[arg(long, global = true)]
    registry: Option<PathBuf>,
    /// Package store root (overrides pkgscope.toml)
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

/// Identifies one artifact.
#[derive(Args)]
struct ArtifactOpts {
    /// Package id
    package_id: String,
    /// Artifact file name (default: <package id>.dll)
    #[arg(long)]
    artifact: Option<String>,
    /// Exact package version (default: latest)
    #[arg(long)]
    version: Option<String>,
    /// Platform tag, e.g. netstandard2.0
    #[arg(long)]
    platform: Option<String>,
}

impl From<ArtifactOpts> for ArtifactArgs {
    fn from(o: ArtifactOpts) -> Self {
        ArtifactArgs {
            package_id: o.package_id,
            artifact_name: o.artifact,
            version: o.version,
            platform: o.platform,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Search packages by free text
    Search {
        query: String,
        /// Maximum results (1-100)
        #[arg(long)]
        max_results: Option<usize>,
    },
    /// Show versions, authors and dependencies of a package
    Details { package_id: String },
    /// List platform groups and binaries of a package version
    Artifacts {
        package_id: String,
        /// Exact package version (default: latest)
        #[arg(long)]
        version: Option<String>,
    },
    /// Analyze one artifact and summarize it
    Analyze {
        #[command(flatten)]
        artifact: ArtifactOpts,
    },
    /// Analyze every binary of one platform group
    AnalyzeAll {
        package_id: String,
        #[arg(long)]
        version: Option<String>,
        #[arg(long)]
        platform: Option<String>,
    },
    /// List the members of a type
    Members {
        #[command(flatten)]
        artifact: ArtifactOpts,
        /// Type name: fully-qualified, display or simple name
        #[arg(long = "type")]
        type_name: String,
        /// Include members inherited from base types
        #[arg(long)]
        inherited: bool,
        /// Include non-public members
        #[arg(long)]
        all: bool,
        /// Member name pattern (`*` wildcard)
        #[arg(long)]
        pattern: Option<String>,
        /// Member kind (method, constructor, property, field, event)
        #[arg(long)]
        kind: Option<String>,
    },
    /// Search types of an artifact
    Types {
        #[command(flatten)]
        artifact: ArtifactOpts,
        /// Full-name pattern (`*` wildcard)
        #[arg(long)]
        pattern: Option<String>,
        /// Type kind (class, interface, enum, struct)
        #[arg(long)]
        kind: Option<String>,
        /// Include non-public types
        #[arg(long)]
        all: bool,
        /// Maximum types listed (1-500)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Answer JSON tool calls from stdin, one per line
    Serve,
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("PKGSCOPE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let cwd = std::env::current_dir()?;
    let mut config = Config::find_and_load(&cwd)?
        .map(|(config, _)| config)
        .unwrap_or_default();
    if let Some(root) = &cli.registry {
        config.registry.root = Some(root.clone());
    }
    if let Some(root) = &cli.store {
        config.store.root = Some(root.clone());
    }
    Ok(config)
}

fn build_toolbox(config: &Config, one_shot: bool) -> Result<Toolbox> {
    let registry_root = config
        .registry
        .root
        .clone()
        .context("no registry configured; pass --registry or set [registry] root in pkgscope.toml")?;
    let store = config.package_store()?;
    let clock = Arc::new(SystemClock);

    let local = Arc::new(LocalRegistry::new(registry_root, store.clone()));
    let registry = Arc::new(CachingRegistry::new(local, config.metadata_ttl(), clock.clone()));
    let cache = Arc::new(AnalysisCache::new(config.cache_ttl(), clock));
    let service = AnalysisService::new(registry, Arc::new(ManifestAnalyzer), store, cache)
        .with_policy(config.legacy_policy())
        .with_timeouts(config.timeouts());
    Ok(Toolbox::new(Arc::new(service)).analyze_on_miss(one_shot))
}

fn tool_call(command: Commands) -> Option<ToolCall> {
    let call = match command {
        Commands::Search { query, max_results } => {
            ToolCall::SearchPackages(SearchPackagesArgs { query, max_results })
        }
        Commands::Details { package_id } => ToolCall::GetPackageDetails(PackageArgs { package_id }),
        Commands::Artifacts { package_id, version } => {
            ToolCall::ListPackageArtifacts(PackageVersionArgs { package_id, version })
        }
        Commands::Analyze { artifact } => ToolCall::AnalyzeArtifact(artifact.into()),
        Commands::AnalyzeAll {
            package_id,
            version,
            platform,
        } => ToolCall::AnalyzeAllArtifacts(AnalyzeAllArgs {
            package_id,
            version,
            platform,
        }),
        Commands::Members {
            artifact,
            type_name,
            inherited,
            all,
            pattern,
            kind,
        } => ToolCall::ListTypeMembers(ListTypeMembersArgs {
            artifact: artifact.into(),
            type_name,
            include_inherited: inherited,
            public_only: !all,
            pattern,
            kind,
        }),
        Commands::Types {
            artifact,
            pattern,
            kind,
            all,
            limit,
        } => ToolCall::SearchTypes(SearchTypesArgs {
            artifact: artifact.into(),
            pattern,
            kind,
            public_only: !all,
            limit,
        }),
        Commands::Serve => return None,
    };
    Some(call)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;

    match tool_call(cli.command) {
        Some(call) => {
            let toolbox = build_toolbox(&config, true)?;
            let report = runtime.block_on(toolbox.call(&call, &CancellationToken::new()));
            print!("{report}");
            if report.starts_with("Error") {
                process::exit(2);
            }
            Ok(())
        }
        None => {
            let toolbox = build_toolbox(&config, false)?;
            runtime.block_on(serve::run(&toolbox))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_maps_to_tool_calls() {
        let cli = Cli::parse_from([
            "pkgscope",
            "--registry",
            "/feed",
            "members",
            "Newtonsoft.Json",
            "--type",
            "JsonConverter",
            "--inherited",
            "--platform",
            "netstandard2.0",
        ]);
        assert_eq!(cli.registry, Some(PathBuf::from("/feed")));
        let Some(ToolCall::ListTypeMembers(args)) = tool_call(cli.command) else {
            panic!("expected list-type-members");
        };
        assert_eq!(args.artifact.package_id, "Newtonsoft.Json");
        assert_eq!(args.artifact.platform.as_deref(), Some("netstandard2.0"));
        assert!(args.include_inherited);
        assert!(args.public_only);
    }

    #[test]
    fn serve_has_no_single_call() {
        let cli = Cli::parse_from(["pkgscope", "serve", "--store", "/tmp/s"]);
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/s")));
        assert!(tool_call(cli.command).is_none());
    }

    #[test]
    fn toolbox_requires_registry() {
        let err = build_toolbox(&Config::default(), true).err().unwrap();
        assert!(err.to_string().contains("no registry configured"));
    }
}
