use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "marionette-agent")]
#[command(about = "Local HTTP agent for macOS UI automation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch or attach to an application and serve the automation API
    /// scoped to it. Emits one JSON bootstrap line on stdout, logs on
    /// stderr, and exits when the app does.
    Run(RunArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// App to bind to: a display name, a path to an .app bundle, or a
    /// bundle identifier.
    pub app: String,

    /// Host to bind the HTTP server to.
    #[clap(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind; 0 picks a free ephemeral port.
    #[clap(long, default_value_t = 7676)]
    pub port: u16,
}
