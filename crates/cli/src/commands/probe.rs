//! test command - Probe a remote for repository readiness

use clap::Args;
use davsync_core::{StorageTestResult, TransferManager};
use serde::Serialize;

use super::session::Session;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Check whether a remote exists, is writable and holds a repository
#[derive(Args, Debug)]
pub struct TestArgs {
    /// Remote name
    pub remote: String,

    /// Also check that a missing target could be created
    #[arg(long)]
    pub create: bool,
}

#[derive(Serialize)]
struct TestOutput {
    remote: String,
    #[serde(flatten)]
    result: StorageTestResult,
}

fn yes_no(value: bool) -> String {
    let text = if value { "yes" } else { "no" };
    text.to_string()
}

fn result_rows(result: &StorageTestResult) -> Vec<[String; 2]> {
    vec![
        ["Target exists".to_string(), yes_no(result.target_exists)],
        ["Target writable".to_string(), yes_no(result.target_can_write)],
        ["Target creatable".to_string(), yes_no(result.target_can_create)],
        ["Repository found".to_string(), yes_no(result.repo_file_exists)],
    ]
}

pub async fn execute(args: TestArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let mut session = match Session::open(&args.remote, &formatter) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let code = match session.manager.test(args.create).await {
        Ok(result) => {
            if formatter.is_json() {
                formatter.json(&TestOutput {
                    remote: args.remote.clone(),
                    result,
                });
            } else {
                let table = formatter.table(["Check", "Result"], result_rows(&result));
                formatter.println(&table.to_string());
            }
            ExitCode::Success
        }
        Err(e) => session.fail(&formatter, "Storage test failed", &e),
    };

    session.finish(&formatter, code).await
}
