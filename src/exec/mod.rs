use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use anyhow::{bail, Context, Result};

/// Splits a command line the way a POSIX shell would, without running one.
pub fn split_command(cmd: &str) -> Result<(String, Vec<String>)> {
    let mut tokens = shlex::split(cmd).with_context(|| format!("unbalanced quotes in command: {cmd}"))?;
    if tokens.is_empty() {
        bail!("empty command");
    }
    let program = tokens.remove(0);
    Ok((program, tokens))
}

/// Runs `interpreter <script>` from `cwd` in the foreground with the
/// terminal attached.
pub fn run_script(interpreter: &str, script: &Path, cwd: &Path) -> Result<ExitStatus> {
    let (program, mut args) = split_command(interpreter)?;
    let script = std::path::absolute(script).unwrap_or_else(|_| script.to_path_buf());
    args.push(script.to_string_lossy().to_string());
    run_inherited(&program, &args, cwd)
}

/// Runs a full command line in `cwd`, blocking until it exits. A non-zero
/// exit is an error.
pub fn run_command_line(cmd: &str, cwd: &Path) -> Result<()> {
    let (program, args) = split_command(cmd)?;
    let status = run_inherited(&program, &args, cwd)?;
    if !status.success() {
        bail!("command failed ({}): {}", status, cmd);
    }
    Ok(())
}

fn run_inherited(program: &str, args: &[String], cwd: &Path) -> Result<ExitStatus> {
    let mut c = Command::new(program);
    c.args(args)
        .current_dir(cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    let status = c
        .status()
        .with_context(|| format!("failed to spawn {} {}", program, args.join(" ")))?;
    tracing::info!(%program, %status, "process exited");
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_quoted_arguments() {
        let (prog, args) = split_command("python -u 'my script.py'").unwrap();
        assert_eq!(prog, "python");
        assert_eq!(args, vec!["-u", "my script.py"]);
        assert!(split_command("   ").is_err());
        assert!(split_command("echo 'open").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(run_command_line("true", dir.path()).is_ok());
        assert!(run_command_line("false", dir.path()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn script_runs_from_given_cwd() {
        let dir = tempfile::TempDir::new().unwrap();
        let project = dir.path().join("proj");
        std::fs::create_dir(&project).unwrap();
        let script = project.join("main.sh");
        std::fs::write(&script, "touch ran.txt\n").unwrap();
        let status = run_script("sh", &script, dir.path()).unwrap();
        assert!(status.success());
        assert!(dir.path().join("ran.txt").exists());
    }
}
