//! init command - Prepare the repository layout on a remote

use clap::Args;
use davsync_core::TransferManager;
use serde::Serialize;

use super::session::Session;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Prepare the repository folders on a remote
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Remote name
    pub remote: String,

    /// Create the repository root and folders if they do not exist
    #[arg(long)]
    pub create: bool,
}

#[derive(Serialize)]
struct InitOutput {
    remote: String,
    url: String,
    created: bool,
}

pub async fn execute(args: InitArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let mut session = match Session::open(&args.remote, &formatter) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let code = match session.manager.init(args.create).await {
        Ok(()) => {
            let url = session.manager.layout().root().to_string();
            if formatter.is_json() {
                formatter.json(&InitOutput {
                    remote: args.remote.clone(),
                    url,
                    created: args.create,
                });
            } else {
                formatter.success(&format!(
                    "Repository at {} is ready.",
                    formatter.style_url(&url)
                ));
            }
            ExitCode::Success
        }
        Err(e) => session.fail(&formatter, "Failed to initialize repository", &e),
    };

    session.finish(&formatter, code).await
}
