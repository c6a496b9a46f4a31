//! Command dispatch logic for trust-score

use super::{InitArgs, RateArgs, init_config, process_rate};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "trust-score", author, version, long_about = None)]
#[command(about = "Score the trustworthiness of machine-learning models, their code, and their datasets")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: TrustScoreSubcommand,
}

#[derive(Subcommand, Debug)]
enum TrustScoreSubcommand {
    /// Rate every entry in a URL file and print one JSON record per entry
    Rate(Box<RateArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        TrustScoreSubcommand::Rate(rate_args) => process_rate(host, rate_args).await,
        TrustScoreSubcommand::Init(init_args) => init_config(host, init_args),
    }
}
