use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_PREVIEW_PORT;

#[derive(Parser, Debug)]
#[command(name = "acornix", version, about = "Plugin-driven terminal shell that builds apps with an AI provider")]
pub struct Args {
    /// Workspace holding config.json, my_apps/, plugins/ and backups/.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Port the preview server listens on.
    #[arg(long, default_value_t = DEFAULT_PREVIEW_PORT)]
    pub port: u16,

    /// Command used to run generated scripts.
    #[arg(long, default_value = "python")]
    pub interpreter: String,

    /// Debug-level logs on stderr.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve the workspace over HTTP on localhost.
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["acornix"]);
        assert_eq!(args.root, PathBuf::from("."));
        assert_eq!(args.port, 8080);
        assert_eq!(args.interpreter, "python");
        assert!(!args.verbose);
        assert!(args.command.is_none());
    }

    #[test]
    fn serve_subcommand() {
        let args = Args::parse_from(["acornix", "--root", "/tmp/ws", "serve", "--port", "9000"]);
        assert_eq!(args.root, PathBuf::from("/tmp/ws"));
        assert_eq!(args.command, Some(Command::Serve { port: Some(9000) }));
    }
}
