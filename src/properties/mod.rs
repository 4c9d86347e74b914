//! Tool properties: docking options, workflow flags and container settings

use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Smallest seed accepted by the wrapped tool's callers
pub const MIN_SEED: i64 = -9_999_999;

/// Largest seed accepted by the wrapped tool's callers
pub const MAX_SEED: i64 = 9_999_999;

/// Default image used when running inside a container
pub const DEFAULT_CONTAINER_IMAGE: &str = "biocontainers/smina:v1.1.2-5b1-deb_cv1";

/// Every property name this building block understands
pub const KNOWN_PROPERTIES: &[&str] = &[
    "cpu",
    "exhaustiveness",
    "num_modes",
    "min_rmsd_filter",
    "energy_range",
    "binary_path",
    "scoring",
    "seed",
    "remove_tmp",
    "restart",
    "sandbox_path",
    "container_path",
    "container_image",
    "container_volume_path",
    "container_working_dir",
    "container_user_id",
    "container_shell_path",
];

/// Errors that can occur when loading properties
#[derive(Error, Debug)]
pub enum PropertiesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON properties: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML properties: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Config file {} does not exist", .0.display())]
    MissingConfig(PathBuf),

    #[error("Properties must be a mapping of names to values")]
    NotAMapping,

    #[error("Property {name} = {value} is outside the allowed range [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        value: String,
        min: String,
        max: String,
    },
}

/// Options for a smina run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SminaProperties {
    /// Number of CPUs to use
    pub cpu: u32,

    /// Exhaustiveness of the global search (roughly proportional to time)
    pub exhaustiveness: u32,

    /// Maximum number of binding modes to generate
    pub num_modes: u32,

    /// Minimum RMSD between output poses
    pub min_rmsd_filter: f64,

    /// Maximum energy difference between the best and worst mode (kcal/mol)
    pub energy_range: f64,

    /// Path to the smina executable
    pub binary_path: String,

    /// Scoring function name
    pub scoring: String,

    /// Random seed; drawn at random when absent
    pub seed: Option<i64>,

    /// Remove the sandbox directory after the run
    pub remove_tmp: bool,

    /// Skip the run when all outputs already exist
    pub restart: bool,

    /// Parent directory of the per-run sandbox
    pub sandbox_path: PathBuf,

    /// Container runtime executable; runs locally when absent
    pub container_path: Option<String>,

    pub container_image: String,

    /// Mount point of the sandbox inside the container
    pub container_volume_path: String,

    pub container_working_dir: Option<String>,

    pub container_user_id: Option<String>,

    /// Shell used to run the command inside the container
    pub container_shell_path: String,
}

impl Default for SminaProperties {
    fn default() -> Self {
        Self {
            cpu: 1,
            exhaustiveness: 8,
            num_modes: 9,
            min_rmsd_filter: 1.0,
            energy_range: 3.0,
            binary_path: "smina".to_string(),
            scoring: "vina".to_string(),
            seed: None,
            remove_tmp: true,
            restart: false,
            sandbox_path: PathBuf::from("./"),
            container_path: None,
            container_image: DEFAULT_CONTAINER_IMAGE.to_string(),
            container_volume_path: "/tmp".to_string(),
            container_working_dir: None,
            container_user_id: None,
            container_shell_path: "/bin/bash".to_string(),
        }
    }
}

impl SminaProperties {
    /// Load properties from a config argument.
    ///
    /// The argument is either a path to a YAML or JSON file, or an inline
    /// JSON/YAML mapping. An empty string yields the defaults.
    pub fn from_config(config: &str) -> Result<Self, PropertiesError> {
        let trimmed = config.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        let path = Path::new(trimmed);
        let value: Value = if path.is_file() {
            debug!("Reading properties from {}", path.display());
            let text = std::fs::read_to_string(path)?;
            let is_json = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("json"))
                .unwrap_or(false);
            if is_json {
                serde_json::from_str(&text)?
            } else {
                serde_yaml::from_str(&text)?
            }
        } else if looks_like_config_path(trimmed) {
            return Err(PropertiesError::MissingConfig(path.to_path_buf()));
        } else {
            // YAML also covers inline JSON and flow mappings
            serde_yaml::from_str(trimmed)?
        };

        Self::from_value(value)
    }

    /// Build properties from an already parsed document.
    ///
    /// A top-level `properties` mapping takes precedence over the document itself.
    pub fn from_value(value: Value) -> Result<Self, PropertiesError> {
        let mut map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            _ => return Err(PropertiesError::NotAMapping),
        };

        let map = match map.remove("properties") {
            Some(Value::Object(inner)) => inner,
            Some(Value::Null) => Map::new(),
            Some(_) => return Err(PropertiesError::NotAMapping),
            None => map,
        };

        for key in map.keys() {
            if !KNOWN_PROPERTIES.contains(&key.as_str()) {
                warn!("Ignoring unknown property: {}", key);
            }
        }

        let properties: Self = serde_json::from_value(Value::Object(map))?;
        properties.validate()?;
        Ok(properties)
    }

    /// Check every numeric property against its allowed range
    pub fn validate(&self) -> Result<(), PropertiesError> {
        check_range("cpu", self.cpu, 1, 1000)?;
        check_range("exhaustiveness", self.exhaustiveness, 1, 10000)?;
        check_range("num_modes", self.num_modes, 1, 1000)?;
        check_range("min_rmsd_filter", self.min_rmsd_filter, 1.0, 1000.0)?;
        check_range("energy_range", self.energy_range, 1.0, 1000.0)?;
        if let Some(seed) = self.seed {
            check_range("seed", seed, MIN_SEED, MAX_SEED)?;
        }
        Ok(())
    }

    /// The configured seed, or a fresh random one
    pub fn resolve_seed(&self) -> i64 {
        self.seed
            .unwrap_or_else(|| rand::thread_rng().gen_range(MIN_SEED..=MAX_SEED))
    }

    /// Resolved properties as JSON, for logging
    pub fn to_json(&self) -> Result<String, PropertiesError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Is the run wrapped in a container runtime?
    pub fn uses_container(&self) -> bool {
        self.container_path.is_some()
    }
}

/// Text naming a config file rather than holding an inline mapping
fn looks_like_config_path(text: &str) -> bool {
    let has_config_extension = Path::new(text)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| ["yml", "yaml", "json"].iter().any(|c| c.eq_ignore_ascii_case(e)))
        .unwrap_or(false);
    has_config_extension && !text.contains(':') && !text.contains('{')
}

fn check_range<T>(name: &'static str, value: T, min: T, max: T) -> Result<(), PropertiesError>
where
    T: PartialOrd + ToString,
{
    // NaN fails both comparisons, so test for membership rather than exclusion
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(PropertiesError::OutOfRange {
            name,
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        })
    }
}
