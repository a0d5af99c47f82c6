use clap::Parser;

mod artifact;
mod backup;
mod builtins;
mod cli;
mod config;
mod context;
mod errors;
mod exec;
mod menu;
mod pipeline;
mod plugin;
mod preview;
mod prompt;
mod provider;
mod response;
mod safety;
mod session;
mod ux;

#[cfg(test)]
mod testing;

use cli::{Args, Command};
use config::Workspace;
use provider::ConfiguredProviders;
use session::Session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut workspace = Workspace::new(&args.root);
    workspace.preview_port = args.port;
    workspace.interpreter = args.interpreter.clone();

    match args.command {
        Some(Command::Serve { port }) => {
            let port = port.unwrap_or(workspace.preview_port);
            preview::serve(&workspace.root, port).await
        }
        None => {
            tracing::info!(root = %workspace.root.display(), "starting shell");
            let providers = ConfiguredProviders { config_path: workspace.config_file() };
            let mut session = Session::new(workspace, Box::new(ux::StdTerminal), Box::new(providers));
            menu::run(&builtins::registry(), &mut session).await
        }
    }
}
