//! Command-line interface parsing for skycast
//!
//! Arguments pick the initial lookup target, unit system and output mode.
//! Anything not given on the command line falls back to the config file.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::config::Config;
use crate::data::{Coordinates, LocationSpec, Units};
use crate::session::QueryTarget;

/// Error types for CLI argument validation
#[derive(Debug, Error, PartialEq)]
pub enum CliError {
    #[error("Invalid latitude {0}: must be between -90 and 90")]
    InvalidLatitude(f64),

    #[error("Invalid longitude {0}: must be between -180 and 180")]
    InvalidLongitude(f64),

    #[error("City name must not be empty")]
    EmptyCity,
}

/// skycast - current weather and forecast in the terminal
#[derive(Parser, Debug)]
#[command(name = "skycast")]
#[command(about = "Current conditions and a short forecast for any city")]
#[command(version)]
pub struct Cli {
    /// City to look up, e.g. `skycast New York`
    #[arg(value_name = "CITY", conflicts_with_all = ["lat", "here"])]
    pub city: Vec<String>,

    /// Latitude of the location to look up
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude of the location to look up
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Look up the weather where this machine is
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    pub here: bool,

    /// Unit system for temperatures and wind speed
    #[arg(short, long, value_enum)]
    pub units: Option<Units>,

    /// Print the assembled view model as JSON and exit
    #[arg(long)]
    pub json: bool,

    /// Path to a config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// How results are shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Interactive,
    Json,
}

/// Settings derived from CLI arguments and config for application startup
#[derive(Debug, Clone, PartialEq)]
pub struct StartupConfig {
    /// First lookup to run
    pub target: QueryTarget,
    pub units: Units,
    pub output: OutputMode,
}

impl StartupConfig {
    /// Combines parsed arguments with the loaded config
    pub fn from_cli(cli: &Cli, config: &Config) -> Result<Self, CliError> {
        let target = if cli.here {
            QueryTarget::DevicePosition
        } else if let (Some(lat), Some(lon)) = (cli.lat, cli.lon) {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(CliError::InvalidLatitude(lat));
            }
            if !(-180.0..=180.0).contains(&lon) {
                return Err(CliError::InvalidLongitude(lon));
            }
            QueryTarget::Location(LocationSpec::ByCoordinates(Coordinates { lat, lon }))
        } else if !cli.city.is_empty() {
            let city = cli.city.join(" ").trim().to_string();
            if city.is_empty() {
                return Err(CliError::EmptyCity);
            }
            QueryTarget::Location(LocationSpec::ByName(city))
        } else {
            QueryTarget::Location(LocationSpec::ByName(config.default_location.clone()))
        };

        Ok(StartupConfig {
            target,
            units: cli.units.unwrap_or(config.units),
            output: if cli.json {
                OutputMode::Json
            } else {
                OutputMode::Interactive
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn startup(args: &[&str]) -> Result<StartupConfig, CliError> {
        let cli = Cli::parse_from(args);
        StartupConfig::from_cli(&cli, &Config::default())
    }

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["skycast"]);
        assert!(cli.city.is_empty());
        assert!(cli.lat.is_none());
        assert!(!cli.here);
        assert!(!cli.json);
        assert!(cli.units.is_none());
    }

    #[test]
    fn test_startup_defaults_to_configured_location() {
        let config = startup(&["skycast"]).unwrap();
        assert_eq!(
            config.target,
            QueryTarget::Location(LocationSpec::ByName("London".to_string()))
        );
        assert_eq!(config.units, Units::Metric);
        assert_eq!(config.output, OutputMode::Interactive);
    }

    #[test]
    fn test_startup_multi_word_city() {
        let config = startup(&["skycast", "New", "York"]).unwrap();
        assert_eq!(
            config.target,
            QueryTarget::Location(LocationSpec::ByName("New York".to_string()))
        );
    }

    #[test]
    fn test_startup_blank_city_rejected() {
        assert_eq!(startup(&["skycast", "  "]), Err(CliError::EmptyCity));
    }

    #[test]
    fn test_startup_coordinates() {
        let config = startup(&["skycast", "--lat", "-33.87", "--lon", "151.21"]).unwrap();
        assert_eq!(
            config.target,
            QueryTarget::Location(LocationSpec::ByCoordinates(Coordinates {
                lat: -33.87,
                lon: 151.21
            }))
        );
    }

    #[test]
    fn test_startup_out_of_range_coordinates() {
        assert_eq!(
            startup(&["skycast", "--lat", "91", "--lon", "0"]),
            Err(CliError::InvalidLatitude(91.0))
        );
        assert_eq!(
            startup(&["skycast", "--lat", "0", "--lon", "-181"]),
            Err(CliError::InvalidLongitude(-181.0))
        );
    }

    #[test]
    fn test_startup_here() {
        let config = startup(&["skycast", "--here"]).unwrap();
        assert_eq!(config.target, QueryTarget::DevicePosition);
    }

    #[test]
    fn test_startup_units_and_json() {
        let config = startup(&["skycast", "-u", "imperial", "--json", "Paris"]).unwrap();
        assert_eq!(config.units, Units::Imperial);
        assert_eq!(config.output, OutputMode::Json);
    }

    #[test]
    fn test_startup_units_fall_back_to_config() {
        let cli = Cli::parse_from(["skycast"]);
        let file_config = Config {
            units: Units::Imperial,
            default_location: "Denver".to_string(),
            ..Config::default()
        };

        let config = StartupConfig::from_cli(&cli, &file_config).unwrap();

        assert_eq!(config.units, Units::Imperial);
        assert_eq!(
            config.target,
            QueryTarget::Location(LocationSpec::ByName("Denver".to_string()))
        );
    }

    #[test]
    fn test_cli_rejects_conflicting_targets() {
        assert!(Cli::try_parse_from(["skycast", "Paris", "--here"]).is_err());
        assert!(Cli::try_parse_from(["skycast", "--here", "--lat", "1", "--lon", "2"]).is_err());
        assert!(Cli::try_parse_from(["skycast", "Paris", "--lat", "1", "--lon", "2"]).is_err());
    }

    #[test]
    fn test_cli_lat_requires_lon() {
        assert!(Cli::try_parse_from(["skycast", "--lat", "1"]).is_err());
        assert!(Cli::try_parse_from(["skycast", "--lon", "1"]).is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_units() {
        assert!(Cli::try_parse_from(["skycast", "--units", "kelvin"]).is_err());
    }
}
