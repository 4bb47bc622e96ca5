//! mv command - Move a remote object

use clap::Args;
use davsync_core::{RemoteObject, RemoteObjectCategory, TransferManager};
use serde::Serialize;

use super::session::Session;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Move (rename) an object, replacing the target
#[derive(Args, Debug)]
pub struct MvArgs {
    /// Remote name
    pub remote: String,

    /// Source category
    pub source_category: RemoteObjectCategory,

    /// Source name
    pub source_name: String,

    /// Target category
    pub target_category: RemoteObjectCategory,

    /// Target name
    pub target_name: String,
}

#[derive(Serialize)]
struct MvOutput {
    source: String,
    target: String,
}

pub async fn execute(args: MvArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let objects = RemoteObject::new(args.source_category, &args.source_name).and_then(|source| {
        RemoteObject::new(args.target_category, &args.target_name).map(|target| (source, target))
    });
    let (source, target) = match objects {
        Ok(pair) => pair,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::UsageError;
        }
    };

    let mut session = match Session::open(&args.remote, &formatter) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let code = match session.manager.move_object(&source, &target).await {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&MvOutput {
                    source: source.to_string(),
                    target: target.to_string(),
                });
            } else {
                formatter.success(&format!(
                    "Moved {} to {}",
                    formatter.style_object(&source.to_string()),
                    formatter.style_object(&target.to_string())
                ));
            }
            ExitCode::Success
        }
        Err(e) => session.fail(&formatter, "Move failed", &e),
    };

    session.finish(&formatter, code).await
}
