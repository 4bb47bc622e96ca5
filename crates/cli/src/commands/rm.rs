//! rm command - Delete a remote object

use clap::Args;
use davsync_core::{RemoteObject, RemoteObjectCategory, TransferManager};
use serde::Serialize;

use super::session::Session;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Delete an object; deleting a missing object succeeds
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Remote name
    pub remote: String,

    /// Object category
    pub category: RemoteObjectCategory,

    /// Object name
    pub name: String,
}

#[derive(Serialize)]
struct RmOutput {
    object: String,
    deleted: bool,
}

pub async fn execute(args: RmArgs, output_config: OutputConfig) -> ExitCode {
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

    let code = match session.manager.delete(&object).await {
        Ok(deleted) => {
            if formatter.is_json() {
                formatter.json(&RmOutput {
                    object: object.to_string(),
                    deleted,
                });
            }
            if deleted {
                formatter.success(&format!(
                    "Removed {}",
                    formatter.style_object(&object.to_string())
                ));
                ExitCode::Success
            } else {
                formatter.error(&format!("Server refused to delete {object}"));
                ExitCode::GeneralError
            }
        }
        Err(e) => session.fail(&formatter, "Delete failed", &e),
    };

    session.finish(&formatter, code).await
}
