use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gcx", about = "Inspect and rewrite GnuCash XML books", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file with book settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Compression {
    Auto,
    Gzip,
    Plain,
}

#[derive(Subcommand)]
pub enum Command {
    /// Summarize a book: currency, entity counts, load problems
    Info(InfoArgs),
    /// List accounts with balances
    Accounts(AccountsArgs),
    /// Look up the conversion factor for a commodity
    Price(PriceArgs),
    /// Load a book and write it back out
    Rewrite(RewriteArgs),
    /// Check that a book loads cleanly and round-trips unchanged
    Check(CheckArgs),
}

#[derive(Args)]
pub struct InfoArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct AccountsArgs {
    pub file: PathBuf,
    /// Include template accounts of scheduled transactions
    #[arg(long)]
    pub templates: bool,
}

#[derive(Args)]
pub struct PriceArgs {
    pub file: PathBuf,
    /// `NAMESPACE:CODE`, or a bare currency code
    pub commodity: String,
    /// Target currency; the book's default when omitted
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Args)]
pub struct RewriteArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Override the configured compression
    #[arg(long)]
    pub compression: Option<Compression>,
}

#[derive(Args)]
pub struct CheckArgs {
    pub file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_price_with_target() {
        let cli = Cli::try_parse_from(["gcx", "--format", "json", "price", "book.gnucash", "NASDAQ:ACME", "--to", "EUR"])
            .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Command::Price(args) => {
                assert_eq!(args.commodity, "NASDAQ:ACME");
                assert_eq!(args.to.as_deref(), Some("EUR"));
            }
            _ => panic!("expected price"),
        }
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from(["gcx", "rewrite", "a.gnucash", "b.gnucash", "-v", "--compression", "plain"])
            .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Rewrite(args) => assert_eq!(args.compression, Some(Compression::Plain)),
            _ => panic!("expected rewrite"),
        }
    }
}
