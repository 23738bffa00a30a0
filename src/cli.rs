//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::ledger::table::{SortConfig, SortDirection, SortKey};
use crate::models::InvoiceStatus;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SpendLens - invoice spend analytics in your terminal
///
/// Dashboards of spend trends, top vendors, category breakdowns and
/// upcoming cash outflow, plus natural-language questions answered by a
/// local LLM.
///
/// Examples:
///   spendlens account guest
///   spendlens dashboard
///   spendlens invoices --sort amount --desc --page 2
///   spendlens set-status inv_42 paid
///   spendlens ask "top 5 vendors by spend"
///   spendlens init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for .spendlens.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Invoice data file (JSON)
    ///
    /// Generated with mock data on first use if it does not exist.
    #[arg(long, value_name = "FILE", global = true, env = "SPENDLENS_INVOICES")]
    pub invoices: Option<PathBuf>,

    /// Directory holding local account data
    #[arg(long, value_name = "DIR", global = true)]
    pub state_dir: Option<PathBuf>,

    /// Ollama model used by `ask`
    #[arg(short, long, global = true, env = "SPENDLENS_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, global = true, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Request timeout in seconds for the LLM
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT", global = true)]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(short, long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the spend dashboard
    Dashboard,

    /// List invoices, sorted and paginated
    Invoices {
        /// Column to sort by
        #[arg(long, value_enum, default_value = "processed-date")]
        sort: SortKey,

        /// Sort ascending
        #[arg(long, conflicts_with = "desc")]
        asc: bool,

        /// Sort descending (default)
        #[arg(long)]
        desc: bool,

        /// Page to show (1-indexed)
        #[arg(long, default_value = "1")]
        page: usize,
    },

    /// Change the payment status of an invoice
    SetStatus {
        /// Invoice id (inv_1) or number (INV-20230001)
        invoice: String,

        /// New status: paid, pending or not-paid
        status: InvoiceStatus,
    },

    /// Write a fresh mock invoice dataset
    GenerateData {
        /// Number of invoices
        #[arg(long)]
        count: Option<usize>,

        /// RNG seed for a reproducible dataset
        #[arg(long)]
        seed: Option<u64>,

        /// Overwrite an existing data file
        #[arg(long)]
        force: bool,
    },

    /// Ask a question about your invoices in plain English
    ///
    /// Without a question, reads questions from stdin until EOF or `exit`.
    Ask {
        /// The question
        question: Vec<String>,
    },

    /// Manage the local account
    #[command(subcommand)]
    Account(AccountCommand),

    /// Generate a default .spendlens.toml configuration file
    InitConfig,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AccountCommand {
    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "SPENDLENS_PASSWORD")]
        password: String,
        #[arg(long, default_value = "")]
        mobile: String,
    },

    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SPENDLENS_PASSWORD")]
        password: String,
    },

    /// Continue as the guest user
    Guest,

    /// Sign out
    Logout,

    /// Show the signed-in profile
    Whoami,

    /// Update name or mobile number
    UpdateProfile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        mobile: Option<String>,
    },

    /// Set the profile picture URL
    SetAvatar { url: String },
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        match self.command {
            Command::Invoices { page: 0, .. } => {
                return Err("Page must be at least 1".to_string());
            }
            Command::GenerateData { count: Some(0), .. } => {
                return Err("Count must be at least 1".to_string());
            }
            _ => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        }
    }
}

impl Command {
    /// Whether the command needs a signed-in user.
    pub fn requires_sign_in(&self) -> bool {
        matches!(
            self,
            Command::Dashboard
                | Command::Invoices { .. }
                | Command::SetStatus { .. }
                | Command::Ask { .. }
        )
    }

    /// Sorting requested by `invoices`.
    pub fn sort_config(&self) -> SortConfig {
        match *self {
            Command::Invoices {
                sort, asc, desc, ..
            } => SortConfig {
                key: sort,
                direction: if asc && !desc {
                    SortDirection::Ascending
                } else {
                    SortDirection::Descending
                },
            },
            _ => SortConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("spendlens").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_invoices_command() {
        let args = parse(&["invoices", "--sort", "amount", "--asc", "--page", "3"]);
        let sort = args.command.sort_config();
        assert_eq!(sort.key, SortKey::Amount);
        assert_eq!(sort.direction, SortDirection::Ascending);
        assert!(matches!(args.command, Command::Invoices { page: 3, .. }));
    }

    #[test]
    fn test_invoices_default_sort() {
        let args = parse(&["invoices"]);
        assert_eq!(args.command.sort_config(), SortConfig::default());
    }

    #[test]
    fn test_parse_set_status() {
        let args = parse(&["set-status", "inv_7", "not-paid"]);
        match args.command {
            Command::SetStatus { invoice, status } => {
                assert_eq!(invoice, "inv_7");
                assert_eq!(status, InvoiceStatus::NotPaid);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_status_rejected() {
        let result = Args::try_parse_from(["spendlens", "set-status", "inv_7", "overdue"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&["dashboard", "--format", "json", "--invoices", "q1.json"]);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.invoices, Some(PathBuf::from("q1.json")));
        assert!(args.command.requires_sign_in());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = parse(&["dashboard"]);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_page_zero() {
        let args = parse(&["invoices", "--page", "0"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_ollama_url() {
        let mut args = parse(&["ask", "hi"]);
        args.ollama_url = Some("localhost:11434".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_account_commands_skip_sign_in() {
        let args = parse(&["account", "guest"]);
        assert!(!args.command.requires_sign_in());
    }

    #[test]
    fn test_log_level() {
        let mut args = parse(&["dashboard"]);
        assert_eq!(args.log_level(), tracing::Level::WARN);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
