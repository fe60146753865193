use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "skiff",
    version,
    about = "A declarative terminal dashboard for live Kubernetes cluster state."
)]
pub struct CliArgs {
    /// Dashboard config: a local file path or an http(s) URL
    pub config: Option<String>,

    /// Theme overlay file (YAML)
    #[arg(long)]
    pub theme: Option<PathBuf>,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print version information and exit
    Version,
}
