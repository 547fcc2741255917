use std::io::Write;

use crate::cli::{Cli, Command};

/// Dispatch a parsed command line. Returns the process exit code: 0 for a
/// clean run, 1 for a run that completed with recoverable errors. Fatal
/// failures propagate as `Err`.
pub fn run_command(cli: Cli) -> anyhow::Result<i32> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let code = match cli.command {
        Command::Split(args) => crate::split::cmd_split(args, cli.quiet, &mut out)?,
        Command::Join(args) => crate::join::cmd_join(args, &mut out)?,
    };
    out.flush()?;
    Ok(code)
}
