use clap::Parser;
use siteguard::cli::{self, Cli, Commands};
use siteguard::config;
use siteguard::errors::SiteguardError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!cli.no_color)
        .init();

    let result = match cli.command {
        Commands::Scan(args) => cli::scan::handle_scan(args).await,
        Commands::Serve(args) => cli::serve::handle_serve(args).await,
        Commands::Validate(args) => handle_validate(args).await,
    };

    match result {
        Ok(()) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            let exit_code = match &e {
                SiteguardError::Config(_) => 2,
                SiteguardError::Acquisition(_) => 3,
                SiteguardError::SafetyRejection(_) => 5,
                _ => 1,
            };
            std::process::exit(exit_code);
        }
    }
}

async fn handle_validate(args: cli::commands::ValidateArgs) -> Result<(), SiteguardError> {
    let path = std::path::PathBuf::from(&args.config);
    let _config = config::load_config(Some(&path)).await?;
    println!("Configuration is valid: {}", args.config);
    Ok(())
}
