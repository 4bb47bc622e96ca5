//! put command - Upload a local file as a remote object

use std::path::PathBuf;

use clap::Args;
use davsync_core::{RemoteObject, RemoteObjectCategory, TransferManager};
use serde::Serialize;

use super::session::Session;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Upload a file
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Remote name
    pub remote: String,

    /// Local file to upload
    pub local: PathBuf,

    /// Object category
    pub category: RemoteObjectCategory,

    /// Object name (must match the category's naming scheme)
    pub name: String,
}

#[derive(Serialize)]
struct PutOutput {
    object: String,
    url: String,
    size_bytes: u64,
    size_human: String,
}

pub async fn execute(args: PutArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let object = match RemoteObject::new(args.category, &args.name) {
        Ok(o) => o,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::UsageError;
        }
    };
    let size = match std::fs::metadata(&args.local) {
        Ok(meta) if meta.is_file() => meta.len(),
        Ok(_) => {
            formatter.error(&format!("'{}' is not a file", args.local.display()));
            return ExitCode::UsageError;
        }
        Err(e) => {
            formatter.error(&format!("Cannot read '{}': {e}", args.local.display()));
            return ExitCode::NotFound;
        }
    };

    let mut session = match Session::open(&args.remote, &formatter) {
        Ok(s) => s,
        Err(code) => return code,
    };

    session.spinner(format!("Uploading {object}"));
    let code = match session.manager.upload(&args.local, &object).await {
        Ok(()) => {
            let url = session.manager.layout().resolve_url(&object);
            let size_human = humansize::format_size(size, humansize::BINARY);
            if formatter.is_json() {
                formatter.json(&PutOutput {
                    object: object.to_string(),
                    url,
                    size_bytes: size,
                    size_human,
                });
            } else {
                formatter.success(&format!(
                    "Uploaded {} ({})",
                    formatter.style_object(&object.to_string()),
                    formatter.style_size(&size_human)
                ));
            }
            ExitCode::Success
        }
        Err(e) => session.fail(&formatter, "Upload failed", &e),
    };

    session.finish(&formatter, code).await
}
