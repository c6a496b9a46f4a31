//! Command-line interface for trust-score
//!
//! Two commands are exposed:
//!
//! - **rate**: Read a URL file, rate every entry concurrently, and print one JSON record per
//!   entry in input order. Entries that cannot be rated are reported on stderr and make the
//!   process exit with status 1.
//! - **init**: Write the default configuration file.
//!
//! The `run` function parses command-line arguments using clap and routes to the handler.
//! All output goes through a [`Host`] so that commands can be exercised in tests.

mod common;
mod host;
mod init;
mod rate;
mod run;

pub use common::{LogLevel, init_logging};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use rate::{RateArgs, process_rate};
pub use run::run;
