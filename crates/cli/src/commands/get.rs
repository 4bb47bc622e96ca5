//! get command - Download a remote object into a local file

use std::path::PathBuf;

use clap::Args;
use davsync_core::{RemoteObject, RemoteObjectCategory, TransferManager};
use serde::Serialize;

use super::session::Session;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Download an object
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Remote name
    pub remote: String,

    /// Object category
    pub category: RemoteObjectCategory,

    /// Object name
    pub name: String,

    /// Local destination file (overwritten)
    pub local: PathBuf,
}

#[derive(Serialize)]
struct GetOutput {
    object: String,
    local: String,
    size_bytes: u64,
}

pub async fn execute(args: GetArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let object = match RemoteObject::new(args.category, &args.name) {
        Ok(o) => o,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::UsageError;
        }
    };

    let mut session = match Session::open(&args.remote, &formatter) {
        Ok(s) => s,
        Err(code) => return code,
    };

    session.spinner(format!("Downloading {object}"));
    let code = match session.manager.download(&object, &args.local).await {
        Ok(()) => {
            let size = std::fs::metadata(&args.local).map(|m| m.len()).unwrap_or(0);
            if formatter.is_json() {
                formatter.json(&GetOutput {
                    object: object.to_string(),
                    local: args.local.display().to_string(),
                    size_bytes: size,
                });
            } else {
                formatter.success(&format!(
                    "Downloaded {} to {} ({})",
                    formatter.style_object(&object.to_string()),
                    args.local.display(),
                    formatter.style_size(&humansize::format_size(size, humansize::BINARY))
                ));
            }
            ExitCode::Success
        }
        Err(e) => session.fail(&formatter, "Download failed", &e),
    };

    session.finish(&formatter, code).await
}
