use clap::Parser;
use marionette_agent::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Stdout is reserved for the bootstrap record; everything else goes to
    // stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(args).await,
    }
}

#[cfg(target_os = "macos")]
async fn run(args: marionette_agent::cli::RunArgs) -> anyhow::Result<()> {
    use marionette::platforms::macos::MacPlatform;
    use marionette::{AppSpec, PlatformHandle};

    let platform = PlatformHandle::spawn(|| Box::new(MacPlatform::new()) as _);
    let spec = AppSpec::parse(&args.app);
    marionette_agent::lifecycle::run(platform, spec, args.host, args.port).await?;
    Ok(())
}

#[cfg(not(target_os = "macos"))]
async fn run(_args: marionette_agent::cli::RunArgs) -> anyhow::Result<()> {
    anyhow::bail!("marionette-agent drives macOS accessibility APIs and only runs on macOS")
}
