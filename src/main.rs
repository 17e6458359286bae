use clap::{Parser, Subcommand};
use extra_routes::hook::{self, HookError, Mode};
use extra_routes::sources::Fetcher;
use extra_routes::{platform, run_down, run_up, Config};
use std::path::PathBuf;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "extra-routes")]
#[command(about = "VPN hook that keeps published service IP ranges routed through the tunnel")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Tunnel gateway address (overrides the environment variable)
    #[arg(short, long, global = true)]
    gateway: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Install extra routes after the VPN comes up
    ///
    /// Called by the VPN client's route-up hook with the tunnel gateway
    /// exported in the environment.
    Up,
    /// Remove extra routes before the VPN goes down
    Down,
    /// Generate default config file
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Set up logging
    // Hook output goes to stderr to avoid interfering with the VPN client
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let result = match cli.command {
        Commands::Up => run_hook(Mode::Up, &cli).await,
        Commands::Down => run_hook(Mode::Down, &cli).await,
        Commands::Init => {
            let config = Config::default();
            let path = PathBuf::from("extra-routes.toml");
            config.save(&path).map_err(HookError::from).map(|()| {
                println!("Created default config: extra-routes.toml");
            })
        }
    };

    if let Err(e) = result {
        error!("Hook failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

/// Wire the real fetcher, route table, and gateway, then dispatch by mode
async fn run_hook(mode: Mode, cli: &Cli) -> Result<(), HookError> {
    let config = Config::resolve(cli.config.as_deref())?;

    let gateway = match &cli.gateway {
        Some(gateway) => gateway.clone(),
        None => hook::env::gateway_from_env(&config.gateway_var)?,
    };
    debug!("Tunnel gateway address: {}", gateway);

    let table = platform::get_route_table()?;

    match mode {
        Mode::Up => {
            let fetcher = Fetcher::new()?;
            run_up(&config, &fetcher, table.as_ref(), &gateway).await?;
        }
        Mode::Down => {
            run_down(&config, table.as_ref(), &gateway)?;
        }
    }

    info!("Hook completed successfully");
    Ok(())
}
