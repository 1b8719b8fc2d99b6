use std::io;
use std::process::{Command, Output};

/// Execute a command without a shell and capture its output
pub fn execute_command(cmd: &str, args: &[String]) -> io::Result<Output> {
    log::debug!("Running {} {}", cmd, args.join(" "));
    Command::new(cmd).args(args).output()
}
