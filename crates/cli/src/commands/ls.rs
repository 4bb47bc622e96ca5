//! ls command - List the objects of one category

use clap::Args;
use davsync_core::{RemoteObjectCategory, TransferManager};
use serde::Serialize;

use super::session::Session;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// List remote objects of a category
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Remote name
    pub remote: String,

    /// Object category (multichunk, database, cleanup, action, transaction, temporary, repository, generic)
    pub category: RemoteObjectCategory,
}

#[derive(Serialize)]
struct LsOutput {
    remote: String,
    category: RemoteObjectCategory,
    objects: Vec<String>,
}

pub async fn execute(args: LsArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let mut session = match Session::open(&args.remote, &formatter) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let code = match session.manager.list(args.category).await {
        Ok(objects) => {
            if formatter.is_json() {
                formatter.json(&LsOutput {
                    remote: args.remote.clone(),
                    category: args.category,
                    objects: objects.into_keys().collect(),
                });
            } else if objects.is_empty() {
                formatter.println(&format!(
                    "No {} objects.",
                    formatter.style_category(&args.category.to_string())
                ));
            } else {
                for name in objects.keys() {
                    formatter.println(&formatter.style_object(name));
                }
            }
            ExitCode::Success
        }
        Err(e) => session.fail(&formatter, "Failed to list objects", &e),
    };

    session.finish(&formatter, code).await
}
