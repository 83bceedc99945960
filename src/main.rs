//! Jiraform - declarative reconciliation of Jira configuration
//!
//! Main entry point for the jiraform CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use jiraform::config::JiraformConfig;
use jiraform::host::{Address, Applier, Manifest, Plan, State};
use jiraform::reconciler::ResourceKind;
use jiraform::resolver::{LookupKind, Resolver};
use jira_rest::JiraClient;
use std::path::{Path, PathBuf};
use std::process;

/// Jiraform - keep Jira configuration in line with a manifest
#[derive(Parser, Debug)]
#[command(name = "jiraform")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/jiraform/config.yaml)
    #[arg(short, long, env = "JIRAFORM_CONFIG")]
    config: Option<PathBuf>,

    /// Path to state file (default: state_path from config)
    #[arg(short, long)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Refresh state and show the changes an apply would make
    Plan {
        /// Manifest file
        #[arg(short, long, default_value = "jiraform.yaml")]
        manifest: PathBuf,
    },

    /// Refresh state, plan and carry out the changes
    Apply {
        /// Manifest file
        #[arg(short, long, default_value = "jiraform.yaml")]
        manifest: PathBuf,
    },

    /// Re-read every managed instance and update the state file
    Refresh,

    /// Remove every managed instance
    Destroy,

    /// Adopt an existing Jira entity
    Import {
        /// Resource kind (e.g. group, project, group_membership)
        kind: ResourceKind,

        /// Local name for the instance
        name: String,

        /// Remote id, natural key, or group_name/account_id for memberships
        import_id: String,
    },

    /// Look up an existing entity by id or name and print it as JSON
    Lookup {
        /// Kind of entity (group, issue_type, issue_type_scheme, permission_scheme, workflow, user)
        kind: LookupKind,

        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        name: Option<String>,
    },
}

fn main() {
    // Initialize logging
    if let Err(e) = jiraform::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = JiraformConfig::load_or_default(cli.config.as_deref())?;
    let state_path = cli.state.clone().unwrap_or_else(|| config.state_path.clone());
    let client = config.build_client()?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(execute(cli.command, client, state_path))
}

async fn execute(command: Commands, client: JiraClient, state_path: PathBuf) -> anyhow::Result<()> {
    match command {
        Commands::Plan { manifest } => {
            let applier = Applier::new(client, &state_path);
            let (plan, _) = refresh_and_plan(&applier, &manifest, &state_path).await?;
            print!("{}", plan.render());
            Ok(())
        }
        Commands::Apply { manifest } => {
            let applier = Applier::new(client, &state_path);
            let (plan, mut state) = refresh_and_plan(&applier, &manifest, &state_path).await?;
            print!("{}", plan.render());
            if !plan.has_changes() {
                return Ok(());
            }
            let report = applier.apply(&plan, &mut state).await?;
            print!("{}", report.render());
            ensure_success(&report)
        }
        Commands::Refresh => {
            let applier = Applier::new(client, &state_path);
            let mut state = load_state(&state_path)?;
            let report = applier.refresh(&mut state).await?;
            print!("{}", report.render());
            ensure_success(&report)
        }
        Commands::Destroy => {
            let applier = Applier::new(client, &state_path);
            let mut state = load_state(&state_path)?;
            let plan = Plan::destroy(&state);
            print!("{}", plan.render());
            let report = applier.apply(&plan, &mut state).await?;
            print!("{}", report.render());
            ensure_success(&report)
        }
        Commands::Import {
            kind,
            name,
            import_id,
        } => {
            let applier = Applier::new(client, &state_path);
            let mut state = load_state(&state_path)?;
            let address = Address::new(kind, name);
            let applied = applier.import(&address, &import_id, &mut state).await?;
            println!("Imported {} (id {})", address, applied.id);
            Ok(())
        }
        Commands::Lookup { kind, id, name } => {
            let resolver = Resolver::new(client);
            let entity = resolver
                .resolve_hints(kind, id.as_deref(), name.as_deref())
                .await?;
            println!("{}", serde_json::to_string_pretty(&entity)?);
            Ok(())
        }
    }
}

fn load_state(path: &Path) -> anyhow::Result<State> {
    State::load(path).with_context(|| format!("Failed to read state file {}", path.display()))
}

async fn refresh_and_plan(
    applier: &Applier,
    manifest_path: &Path,
    state_path: &Path,
) -> anyhow::Result<(Plan, State)> {
    let manifest = Manifest::load(manifest_path)?;
    let mut state = load_state(state_path)?;

    let refreshed = applier.refresh(&mut state).await?;
    ensure_success(&refreshed).context("Refresh failed; not planning against stale state")?;

    let plan = Plan::build(&manifest, &state);
    Ok((plan, state))
}

fn ensure_success(report: &jiraform::host::ApplyReport) -> anyhow::Result<()> {
    let failed = report.failures().count();
    if failed > 0 {
        anyhow::bail!("{} of {} instance(s) failed", failed, report.outcomes.len());
    }
    Ok(())
}
