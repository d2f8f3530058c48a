pub mod toml_config;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_dataset_extension, validate_path, validate_positive_distance, Validate,
};
use serde::{Deserialize, Serialize};
use toml_config::TomlConfig;

pub const DEFAULT_DATASET_PATH: &str = "pharmacies.json";

/// Effective settings after merging the config file with command-line
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub dataset_path: String,
    pub default_max_distance: Option<f64>,
    pub json_logs: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dataset_path: DEFAULT_DATASET_PATH.to_string(),
            default_max_distance: None,
            json_logs: false,
        }
    }
}

impl From<TomlConfig> for Settings {
    fn from(config: TomlConfig) -> Self {
        Self {
            dataset_path: config.store.path,
            default_max_distance: config.search.default_max_distance,
            json_logs: config.logging.json,
        }
    }
}

impl ConfigProvider for Settings {
    fn dataset_path(&self) -> &str {
        &self.dataset_path
    }

    fn default_max_distance(&self) -> Option<f64> {
        self.default_max_distance
    }

    fn json_logs(&self) -> bool {
        self.json_logs
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_path("dataset", &self.dataset_path)?;
        validate_dataset_extension("dataset", &self.dataset_path)?;
        if let Some(distance) = self.default_max_distance {
            validate_positive_distance("default_max_distance", distance)?;
        }
        Ok(())
    }
}

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command};

#[cfg(feature = "cli")]
mod cli {
    use super::{Settings, TomlConfig};
    use crate::utils::error::Result;
    use crate::utils::validation::{
        validate_latitude, validate_longitude, validate_positive_distance, Validate,
    };
    use clap::{Parser, Subcommand};

    #[derive(Debug, Clone, Parser)]
    #[command(name = "pharmacy-locator")]
    #[command(about = "Find on-guard pharmacies near a location and manage duty status")]
    pub struct CliConfig {
        /// Path to a TOML configuration file
        #[arg(short, long)]
        pub config: Option<String>,

        /// Dataset file (.json or .csv), overrides the config file
        #[arg(long)]
        pub dataset: Option<String>,

        /// Emit logs as JSON lines
        #[arg(long)]
        pub json_logs: bool,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, PartialEq, Subcommand)]
    pub enum Command {
        /// On-guard pharmacies with their distance in km from a point
        Guard {
            #[arg(long, allow_negative_numbers = true)]
            latitude: f64,
            #[arg(long, allow_negative_numbers = true)]
            longitude: f64,
        },
        /// All on-guard pharmacies, no distance
        OnGuard,
        /// Text and/or proximity search
        Search {
            #[arg(short, long)]
            query: Option<String>,
            #[arg(long, allow_negative_numbers = true)]
            latitude: Option<f64>,
            #[arg(long, allow_negative_numbers = true)]
            longitude: Option<f64>,
            /// Meters
            #[arg(long)]
            max_distance: Option<f64>,
        },
        /// Show one pharmacy
        Details { id: String },
        /// Mark a pharmacy as on duty
        OnDuty { id: String },
        /// Mark a pharmacy as off duty
        OffDuty { id: String },
    }

    impl CliConfig {
        pub fn resolve(&self) -> Result<Settings> {
            let mut settings = match &self.config {
                Some(path) => {
                    tracing::debug!("Loading configuration from {}", path);
                    Settings::from(TomlConfig::from_file(path)?)
                }
                None => Settings::default(),
            };

            if let Some(dataset) = &self.dataset {
                settings.dataset_path = dataset.clone();
            }
            if self.json_logs {
                settings.json_logs = true;
            }

            Ok(settings)
        }
    }

    impl Validate for Command {
        fn validate(&self) -> Result<()> {
            match self {
                Command::Guard {
                    latitude,
                    longitude,
                } => {
                    validate_latitude("latitude", *latitude)?;
                    validate_longitude("longitude", *longitude)?;
                }
                Command::Search {
                    latitude,
                    longitude,
                    max_distance,
                    ..
                } => {
                    if let Some(latitude) = latitude {
                        validate_latitude("latitude", *latitude)?;
                    }
                    if let Some(longitude) = longitude {
                        validate_longitude("longitude", *longitude)?;
                    }
                    if let Some(distance) = max_distance {
                        validate_positive_distance("max_distance", *distance)?;
                    }
                }
                Command::OnGuard
                | Command::Details { .. }
                | Command::OnDuty { .. }
                | Command::OffDuty { .. } => {}
            }
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::io::Write;
        use tempfile::NamedTempFile;

        #[test]
        fn test_parse_guard_with_negative_longitude() {
            let cli = CliConfig::parse_from([
                "pharmacy-locator",
                "guard",
                "--latitude",
                "34.0522",
                "--longitude",
                "-118.2437",
            ]);

            assert_eq!(
                cli.command,
                Command::Guard {
                    latitude: 34.0522,
                    longitude: -118.2437
                }
            );
            assert!(cli.command.validate().is_ok());
        }

        #[test]
        fn test_out_of_range_coordinates_rejected() {
            let cli = CliConfig::parse_from([
                "pharmacy-locator",
                "search",
                "--latitude",
                "91",
                "--longitude",
                "0",
            ]);
            assert!(cli.command.validate().is_err());
        }

        #[test]
        fn test_resolve_defaults() {
            let cli = CliConfig::parse_from(["pharmacy-locator", "on-guard"]);
            assert_eq!(cli.resolve().unwrap(), Settings::default());
        }

        #[test]
        fn test_resolve_dataset_overrides_config_file() {
            let mut file = NamedTempFile::new().unwrap();
            file.write_all(
                b"[store]\npath = \"from-file.json\"\n[search]\ndefault_max_distance = 2500.0\n",
            )
            .unwrap();
            let config_path = file.path().to_str().unwrap().to_string();

            let cli = CliConfig::parse_from([
                "pharmacy-locator",
                "--config",
                config_path.as_str(),
                "--dataset",
                "override.csv",
                "details",
                "p1",
            ]);

            let settings = cli.resolve().unwrap();
            assert_eq!(settings.dataset_path, "override.csv");
            assert_eq!(settings.default_max_distance, Some(2500.0));
            assert!(settings.validate().is_ok());
        }
    }
}
