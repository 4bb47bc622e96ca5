//! Remote management commands
//!
//! A remote is a named WebDAV repository: URL plus credentials.

use clap::Subcommand;
use davsync_core::{Profile, ProfileManager};
use davsync_webdav::WebdavSettings;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Remote subcommands
#[derive(Subcommand, Debug)]
pub enum RemoteCommands {
    /// Add or update a remote
    Set(SetArgs),

    /// List all configured remotes
    List(ListArgs),

    /// Remove a remote
    Remove(RemoveArgs),
}

/// Arguments for the `remote set` command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Remote name (e.g., "nas", "backup")
    pub name: String,

    /// Repository URL (e.g., `https://nas.local/remote.php/dav/files/alice/repo`)
    pub url: String,

    /// Username
    pub username: String,

    /// Password
    #[arg(long, env = "DAVSYNC_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Arguments for the `remote list` command
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show usernames as well
    #[arg(short, long)]
    pub long: bool,
}

/// Arguments for the `remote remove` command
#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Name of the remote to remove
    pub name: String,
}

#[derive(Serialize)]
struct RemoteListOutput {
    remotes: Vec<RemoteInfo>,
}

/// Remote information for JSON output (without the password)
#[derive(Serialize)]
struct RemoteInfo {
    name: String,
    url: String,
    username: String,
    secure: bool,
}

impl From<&Profile> for RemoteInfo {
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            url: profile.url.clone(),
            username: profile.username.clone(),
            secure: profile.url.to_lowercase().starts_with("https:"),
        }
    }
}

#[derive(Serialize)]
struct RemoteOperationOutput {
    success: bool,
    remote: String,
    message: String,
}

/// Execute a remote subcommand
pub async fn execute(cmd: RemoteCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let profile_manager = match ProfileManager::new() {
        Ok(pm) => pm,
        Err(e) => {
            formatter.error(&format!("Failed to load remotes: {e}"));
            return ExitCode::GeneralError;
        }
    };

    match cmd {
        RemoteCommands::Set(args) => execute_set(args, &profile_manager, &formatter),
        RemoteCommands::List(args) => execute_list(args, &profile_manager, &formatter),
        RemoteCommands::Remove(args) => execute_remove(args, &profile_manager, &formatter),
    }
}

fn execute_set(args: SetArgs, manager: &ProfileManager, formatter: &Formatter) -> ExitCode {
    if args.name.is_empty() {
        formatter.error("Remote name cannot be empty");
        return ExitCode::UsageError;
    }

    // Reject settings the transfer manager would refuse later
    if let Err(e) = WebdavSettings::new(&args.url, &args.username, &args.password) {
        formatter.error(&e.to_string());
        return ExitCode::UsageError;
    }

    let profile = Profile::new(&args.name, &args.url, &args.username, &args.password);
    match manager.set(profile) {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&RemoteOperationOutput {
                    success: true,
                    remote: args.name.clone(),
                    message: format!("Remote '{}' configured successfully", args.name),
                });
            } else {
                let styled_name = formatter.style_name(&args.name);
                formatter.success(&format!("Remote '{styled_name}' configured successfully."));
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from_error(&e)
        }
    }
}

fn execute_list(args: ListArgs, manager: &ProfileManager, formatter: &Formatter) -> ExitCode {
    let profiles = match manager.list() {
        Ok(p) => p,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::GeneralError;
        }
    };

    if formatter.is_json() {
        formatter.json(&RemoteListOutput {
            remotes: profiles.iter().map(RemoteInfo::from).collect(),
        });
    } else if profiles.is_empty() {
        formatter.println("No remotes configured.");
    } else {
        for profile in &profiles {
            let styled_name = formatter.style_name(&format!("{:<12}", profile.name));
            let styled_url = formatter.style_url(&profile.url);
            if args.long {
                let styled_user = formatter.style_key(&profile.username);
                formatter.println(&format!("{styled_name} {styled_url} (user: {styled_user})"));
            } else {
                formatter.println(&format!("{styled_name} {styled_url}"));
            }
        }
    }
    ExitCode::Success
}

fn execute_remove(args: RemoveArgs, manager: &ProfileManager, formatter: &Formatter) -> ExitCode {
    match manager.remove(&args.name) {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&RemoteOperationOutput {
                    success: true,
                    remote: args.name.clone(),
                    message: format!("Remote '{}' removed successfully", args.name),
                });
            } else {
                let styled_name = formatter.style_name(&args.name);
                formatter.success(&format!("Remote '{styled_name}' removed successfully."));
            }
            ExitCode::Success
        }
        Err(davsync_core::Error::ProfileNotFound(_)) => {
            formatter.error(&format!("Remote '{}' not found", args.name));
            ExitCode::NotFound
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::GeneralError
        }
    }
}
