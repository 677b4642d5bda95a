use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::config::ScannerKind;

#[derive(Parser)]
#[command(
    name = "prov",
    about = "Tag-bound product provenance: bind tags, trace custody",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Configuration file (defaults to ./prov.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Provenance server to use instead of an in-process store
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Tag reader attached to this terminal
    #[arg(long, global = true)]
    pub scanner: Option<ScannerKind>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the provenance API server
    Serve(ServeArgs),
    /// Create a product and bind it to the next presented tag
    Bind(BindArgs),
    /// Read a tag and show the product it names
    Resolve(ResolveArgs),
    /// Show a product by id
    Show(ShowArgs),
    /// Record a custody transfer
    Transfer(TransferArgs),
    /// List all products
    List,
    /// Show or initialize configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on (overrides `server.bind_addr`)
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args)]
pub struct LocationArgs {
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

#[derive(Args)]
pub struct BindArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub origin: String,
    #[arg(long)]
    pub batch: String,
    /// Production date, YYYY-MM-DD
    #[arg(long)]
    pub date: NaiveDate,
    #[arg(long)]
    pub created_by: Option<String>,
    /// Use the identifier already on the tag instead of writing a new one
    #[arg(long)]
    pub adopt: bool,
    #[command(flatten)]
    pub location: LocationArgs,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Skip the tag and look up this id
    #[arg(long)]
    pub manual: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub product_id: String,
}

#[derive(Args)]
pub struct TransferArgs {
    /// Product id; read from the next presented tag when omitted
    pub product_id: Option<String>,
    #[arg(long)]
    pub location: String,
    #[arg(long = "by")]
    pub transferred_by: String,
    #[command(flatten)]
    pub position: LocationArgs,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a configuration file with default values
    Init {
        #[arg(default_value = "prov.toml")]
        path: PathBuf,
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_bind_with_position() {
        let cli = Cli::try_parse_from([
            "prov",
            "bind",
            "--name",
            "Organic Apples",
            "--origin",
            "Green Valley Farm",
            "--batch",
            "BATCH-2024-09",
            "--date",
            "2024-09-01",
            "--lat",
            "-33.9",
            "--lon",
            "18.4",
            "--scanner",
            "stdin",
        ])
        .unwrap();
        assert_eq!(cli.scanner, Some(ScannerKind::Stdin));
        let Command::Bind(args) = cli.command else {
            panic!("expected bind");
        };
        assert_eq!(args.date, NaiveDate::from_ymd_opt(2024, 9, 1).unwrap());
        assert_eq!(args.location.lat, Some(-33.9));
        assert!(!args.adopt);
    }

    #[test]
    fn latitude_requires_longitude() {
        let result = Cli::try_parse_from([
            "prov", "transfer", "PRD-1", "--location", "Port", "--by", "Carrier", "--lat", "1.0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn transfer_id_is_optional() {
        let cli = Cli::try_parse_from([
            "prov", "--format", "json", "transfer", "--location", "Port", "--by", "Carrier",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        let Command::Transfer(args) = cli.command else {
            panic!("expected transfer");
        };
        assert!(args.product_id.is_none());
        assert_eq!(args.transferred_by, "Carrier");
    }
}
