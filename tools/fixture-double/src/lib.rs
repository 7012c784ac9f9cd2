pub mod config;
pub mod errors;
pub mod fingerprint;
pub mod logging;
pub mod normalizer;
pub mod replay;
pub mod runtime;
pub mod store;
pub mod types;

use clap::{error::ErrorKind, Parser, Subcommand};
use config::{load_config, CliOverrides};
use errors::FixtureError;
use fingerprint::ScopeId;
use normalizer::Normalizer;
use replay::recording::{
    REQUEST_CONTENT_FILE, REQUEST_META_FILE, RESPONSE_CONTENT_FILE, RESPONSE_META_FILE,
};
use runtime::ProductionRuntime;
use store::FixtureStore;

pub use replay::router::InteractionRouter;

#[derive(Debug, Clone, Parser)]
#[command(name = "fixture-double")]
#[command(about = "Inspect and manage recorded HTTP fixtures")]
pub struct Cli {
    #[arg(long, global = true)]
    pub config: Option<std::path::PathBuf>,
    #[arg(long, global = true)]
    pub root: Option<std::path::PathBuf>,
    #[arg(long, global = true)]
    pub project_id: Option<String>,
    #[arg(long, global = true)]
    pub api_key: Option<String>,
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Print the fixture scope directory name for a test
    Scope { test_name: String },
    /// List the recorded fixtures of a test
    List { test_name: String },
    /// Print the four artifacts of one fixture with live secrets applied
    Show { test_name: String, fixture: String },
    /// Delete every fixture recorded for a test
    Clear { test_name: String },
}

pub fn run() -> Result<i32, FixtureError> {
    let args = std::env::args_os().collect::<Vec<_>>();
    let cwd = std::env::current_dir().map_err(|e| FixtureError::Io(e.to_string()))?;
    let runtime = ProductionRuntime::new();
    run_with_runtime(&args, &cwd, &runtime)
}

pub fn run_with_runtime(
    args: &[std::ffi::OsString],
    cwd: &std::path::Path,
    runtime: &ProductionRuntime,
) -> Result<i32, FixtureError> {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{error}");
                return Ok(0);
            }
            _ => return Err(FixtureError::Cli(error.to_string())),
        },
    };

    let overrides = CliOverrides {
        config_path: cli.config.clone(),
        root: cli.root.clone(),
        record: None,
        project_id: cli.project_id.clone(),
        api_key: cli.api_key.clone(),
    };
    let cfg = load_config(&overrides, cwd, runtime.file_system.as_ref())?;
    let store = FixtureStore::new(cfg.fixtures.root.clone(), runtime.file_system.clone());
    let terminal = runtime.terminal.as_ref();

    match &cli.command {
        CliCommand::Scope { test_name } => {
            let scope = ScopeId::from_test_name(test_name);
            terminal.write_line(&format!(
                "{scope} {}",
                store.scope_path(&scope).display()
            ))?;
        }
        CliCommand::List { test_name } => {
            let scope = ScopeId::from_test_name(test_name);
            let fixtures = store.list(&scope)?;
            if fixtures.is_empty() {
                terminal.write_line(&format!("no fixtures recorded for {scope}"))?;
            }
            for name in fixtures {
                terminal.write_line(&name)?;
            }
        }
        CliCommand::Show { test_name, fixture } => {
            let scope = ScopeId::from_test_name(test_name);
            let artifacts = store.read_named(&scope, fixture)?;
            let normalizer = Normalizer::new(
                cfg.project.project_id.clone(),
                cfg.project.api_key.clone(),
            );
            for (file, text) in [
                (REQUEST_META_FILE, &artifacts.request_meta),
                (REQUEST_CONTENT_FILE, &artifacts.request_content),
                (RESPONSE_META_FILE, &artifacts.response_meta),
                (RESPONSE_CONTENT_FILE, &artifacts.response_content),
            ] {
                terminal.write_line(&format!("== {file} =="))?;
                terminal.write_line(&normalizer.from_portable(text))?;
            }
        }
        CliCommand::Clear { test_name } => {
            let scope = ScopeId::from_test_name(test_name);
            let existed = store.clear(&scope)?;
            terminal.write_line(&format!(
                "{} {scope}",
                if existed { "cleared" } else { "nothing to clear for" }
            ))?;
        }
    }
    Ok(0)
}
