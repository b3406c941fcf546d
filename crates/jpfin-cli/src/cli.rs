//! Command definitions

use clap::{Parser, Subcommand};

/// Japan Finance Agent - compound analysis from six data sources
#[derive(Parser, Debug)]
#[command(name = "japanfinance-agent")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the result as JSON
    #[arg(short = 'j', long = "json", alias = "json-output", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a company (EDINET + TDnet + news + stock price)
    ///
    /// Example: japanfinance-agent analyze 7203 -e E02144 -p 2025
    Analyze {
        /// 4-digit stock code
        code: String,

        /// EDINET code (e.g. E02144); looked up when omitted
        #[arg(short, long)]
        edinet_code: Option<String>,

        /// Fiscal year of the annual report (e.g. 2025)
        #[arg(short, long)]
        period: Option<String>,
    },

    /// Macro-economic snapshot (e-Stat + BOJ + news)
    ///
    /// Example: japanfinance-agent macro -k CPI
    Macro {
        /// e-Stat search keyword
        #[arg(short, long)]
        keyword: Option<String>,

        /// BOJ series as DB'CODE (e.g. "FM01'STRDCLUCON")
        #[arg(short, long, alias = "boj-dataset")]
        boj_series: Option<String>,
    },

    /// Monitor disclosures for a watchlist
    ///
    /// Example: japanfinance-agent monitor 7203 6758 6861
    Monitor {
        /// 4-digit stock codes
        #[arg(required = true)]
        codes: Vec<String>,
    },

    /// Show which data sources are usable
    Test {
        /// Also make one live call to each usable source
        #[arg(long)]
        live: bool,
    },

    /// Start the MCP server on stdio
    Serve,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze() {
        let args = ["japanfinance-agent", "analyze", "7203", "-e", "E02144", "-j"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Analyze { code, edinet_code, period } => {
                assert_eq!(code, "7203");
                assert_eq!(edinet_code.as_deref(), Some("E02144"));
                assert!(period.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_macro_alias() {
        let args = ["japanfinance-agent", "macro", "--boj-dataset", "IR01'MADR1M"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Macro { keyword, boj_series } => {
                assert!(keyword.is_none());
                assert_eq!(boj_series.as_deref(), Some("IR01'MADR1M"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_monitor_requires_codes() {
        assert!(Cli::try_parse_from(["japanfinance-agent", "monitor"]).is_err());
        let args = ["japanfinance-agent", "-v", "monitor", "7203", "6758"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Monitor { ref codes } if codes.len() == 2));
    }
}
