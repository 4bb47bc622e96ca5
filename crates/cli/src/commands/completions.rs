//! completions command - Generate shell completion scripts

use clap::{Args, Command};
use clap_complete::{Shell, generate};

use crate::exit_code::ExitCode;

/// Generate shell completions
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: Shell,
}

pub fn execute(args: CompletionsArgs, command: &mut Command) -> ExitCode {
    let name = command.get_name().to_string();
    generate(args.shell, command, name, &mut std::io::stdout());
    ExitCode::Success
}
