use crate::demo::{run_demo, DemoArgs};
use crate::server;
use crate::session::{self, EvaluateArgs, ListArgs, TransitionArgs};
use clap::{Args, Parser, Subcommand};
use recruitment_pipeline::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Recruitment Pipeline Console",
    about = "Review and move candidates through the recruitment pipeline from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List applications, optionally narrowed by stage chip and status
    List(ListArgs),
    /// Render an application as it appears in the pipeline console
    Show {
        /// Application id
        id: String,
    },
    /// Trigger a pipeline action and render the authoritative result
    Transition(TransitionArgs),
    /// Save criterion scores and notes for the current stage
    Evaluate(EvaluateArgs),
    /// Lock the saved evaluation of the current stage
    Finalize {
        /// Application id
        id: String,
    },
    /// Serve the in-memory HR backend (default command)
    Sandbox(SandboxArgs),
    /// Walk a candidate through every stage against an in-process sandbox
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct SandboxArgs {
    /// Override the configured host for the sandbox server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the sandbox server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// CSV of `id,first_name,last_name,email,role_applied_for` rows to seed
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Sandbox(SandboxArgs::default()));

    match command {
        Command::List(args) => session::list(args).await,
        Command::Show { id } => session::show(id).await,
        Command::Transition(args) => session::transition(args).await,
        Command::Evaluate(args) => session::evaluate(args).await,
        Command::Finalize { id } => session::finalize(id).await,
        Command::Sandbox(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
