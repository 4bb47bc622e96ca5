//! Command implementations
//!
//! Each subcommand lives in its own module and returns an [`ExitCode`].

use clap::Subcommand;

pub mod completions;
pub mod get;
pub mod init;
pub mod ls;
pub mod mv;
pub mod probe;
pub mod put;
pub mod remote;
pub mod rm;
mod session;

use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage remotes (named WebDAV repositories)
    #[command(subcommand)]
    Remote(remote::RemoteCommands),

    /// Prepare the repository layout on a remote
    Init(init::InitArgs),

    /// List objects of one category
    Ls(ls::LsArgs),

    /// Upload a local file as a remote object
    Put(put::PutArgs),

    /// Download a remote object
    Get(get::GetArgs),

    /// Delete a remote object
    Rm(rm::RmArgs),

    /// Move a remote object
    Mv(mv::MvArgs),

    /// Probe a remote for existence, write access and an existing repository
    Test(probe::TestArgs),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Run a command other than `completions`, which needs the full CLI definition
pub async fn execute(command: Commands, output_config: OutputConfig) -> ExitCode {
    match command {
        Commands::Remote(cmd) => remote::execute(cmd, output_config).await,
        Commands::Init(args) => init::execute(args, output_config).await,
        Commands::Ls(args) => ls::execute(args, output_config).await,
        Commands::Put(args) => put::execute(args, output_config).await,
        Commands::Get(args) => get::execute(args, output_config).await,
        Commands::Rm(args) => rm::execute(args, output_config).await,
        Commands::Mv(args) => mv::execute(args, output_config).await,
        Commands::Test(args) => probe::execute(args, output_config).await,
        Commands::Completions(_) => ExitCode::UsageError,
    }
}
