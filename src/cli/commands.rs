use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "siteguard", version, about = "Security and SEO scan pipeline with AI-readable remediation output")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single scan headless and wait for it to finish
    Scan(ScanArgs),
    /// Start the HTTP REST API server
    Serve(ServeArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone)]
pub struct ScanArgs {
    /// Repository URL to check out and analyze
    #[arg(short, long)]
    pub repo: Option<String>,

    /// Deployed URL for dynamic and SEO analysis
    #[arg(short, long)]
    pub url: Option<String>,

    /// Owning user identifier
    #[arg(long, default_value = "cli")]
    pub user: String,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Bind address
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// YAML configuration file to check
    pub config: String,
}
