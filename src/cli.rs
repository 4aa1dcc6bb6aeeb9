use clap::Parser;
use std::path::PathBuf;

/// tripmatch - match upcoming trips from a calendar feed to local contacts
/// and file outreach reminders in Todoist
#[derive(Debug, Parser)]
#[command(name = "tripmatch")]
#[command(about = "Match upcoming trips to local contacts and create outreach reminders", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML run configuration
    pub config: PathBuf,

    /// Process trips even if a previous run already handled them.
    /// The persisted processed-set is bypassed for this run only, never
    /// deleted.
    #[arg(long = "ignore-state")]
    pub ignore_state: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_config_path_and_flag() {
        let cli = Cli::parse_from(["tripmatch", "config.toml", "--ignore-state"]);
        assert_eq!(cli.config, PathBuf::from("config.toml"));
        assert!(cli.ignore_state);
    }

    #[test]
    fn flag_defaults_to_off() {
        let cli = Cli::parse_from(["tripmatch", "config.toml"]);
        assert!(!cli.ignore_state);
    }
}
