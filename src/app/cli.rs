//! Command-Line Interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Spatial Intent - resolve pointing gestures to grounded place identifications
#[derive(Parser, Debug)]
#[command(name = "spatial-intent")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve one captured frame and tap to an identification
    Resolve {
        /// Captured image file
        #[arg(short, long)]
        image: PathBuf,

        /// Normalized tap x in [0, 1]
        #[arg(long, default_value = "0.5")]
        tap_x: f64,

        /// Normalized tap y in [0, 1]
        #[arg(long, default_value = "0.5")]
        tap_y: f64,

        /// Device latitude
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Device longitude
        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Camera field of view override (degrees)
        #[arg(long)]
        fov: Option<f64>,
    },

    /// Replay a recorded signal trace through the gating machine
    Simulate {
        /// Trace file (JSON)
        #[arg(short, long)]
        trace: PathBuf,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the config file path
    Path,

    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_resolve_defaults() {
        let args = vec!["spatial-intent", "resolve", "--image", "frame.jpg"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Resolve {
                image,
                tap_x,
                tap_y,
                lat,
                lon,
                fov,
            } => {
                assert_eq!(image, PathBuf::from("frame.jpg"));
                assert_eq!(tap_x, 0.5);
                assert_eq!(tap_y, 0.5);
                assert!(lat.is_none());
                assert!(lon.is_none());
                assert!(fov.is_none());
            }
            _ => panic!("Expected Resolve command"),
        }
    }

    #[test]
    fn test_cli_parse_resolve_with_all_options() {
        let args = vec![
            "spatial-intent",
            "resolve",
            "--image", "frame.jpg",
            "--tap-x", "0.3",
            "--tap-y", "0.7",
            "--lat", "37.7749",
            "--lon", "-122.4194",
            "--fov", "72.5",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Resolve {
                tap_x,
                tap_y,
                lat,
                lon,
                fov,
                ..
            } => {
                assert_eq!(tap_x, 0.3);
                assert_eq!(tap_y, 0.7);
                assert_eq!(lat, Some(37.7749));
                assert_eq!(lon, Some(-122.4194));
                assert_eq!(fov, Some(72.5));
            }
            _ => panic!("Expected Resolve command"),
        }
    }

    #[test]
    fn test_cli_parse_simulate_command() {
        let args = vec!["spatial-intent", "simulate", "--trace", "session.json"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Simulate { trace } => {
                assert_eq!(trace, PathBuf::from("session.json"));
            }
            _ => panic!("Expected Simulate command"),
        }
    }

    #[test]
    fn test_cli_parse_init_command() {
        let args = vec!["spatial-intent", "init", "--force"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Init { force } => assert!(force),
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn test_cli_parse_config_show() {
        let args = vec!["spatial-intent", "config", "show"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Config {
                action: ConfigAction::Show,
            } => {}
            _ => panic!("Expected Config Show"),
        }
    }

    #[test]
    fn test_cli_parse_config_reset() {
        let args = vec!["spatial-intent", "config", "reset", "--force"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Config {
                action: ConfigAction::Reset { force },
            } => assert!(force),
            _ => panic!("Expected Config Reset"),
        }
    }

    #[test]
    fn test_cli_global_verbose_flag() {
        let args = vec!["spatial-intent", "--verbose", "config", "show"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_global_config_flag() {
        let args = vec![
            "spatial-intent",
            "--config", "/path/to/config.toml",
            "config", "show",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.toml")));
    }

    #[test]
    fn test_cli_missing_required_argument_fails() {
        let args = vec!["spatial-intent", "resolve"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_invalid_command_fails() {
        let args = vec!["spatial-intent", "not-a-command"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_verify_command_structure() {
        let cmd = Cli::command();
        let subcommands: Vec<_> = cmd.get_subcommands().map(|s| s.get_name()).collect();
        assert!(subcommands.contains(&"resolve"));
        assert!(subcommands.contains(&"simulate"));
        assert!(subcommands.contains(&"init"));
        assert!(subcommands.contains(&"config"));
    }
}
