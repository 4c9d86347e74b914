//! Binding site box definition read from the site coordinates file

use nalgebra::Vector3;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when reading a binding site
#[derive(Error, Debug)]
pub enum SiteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Non-finite value for {field}: {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("Box size must be positive, got {field} = {value}")]
    InvalidSize { field: &'static str, value: f64 },
}

/// x/y/z triple as written in the site file
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coords {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<Coords> for Vector3<f64> {
    fn from(c: Coords) -> Self {
        Vector3::new(c.x, c.y, c.z)
    }
}

#[derive(Debug, Deserialize)]
struct SiteFile {
    centroid: Coords,
    size: Coords,
}

/// Search box used to constrain docking
#[derive(Debug, Clone, PartialEq)]
pub struct BindingSite {
    /// Box center in Angstroms
    pub centroid: Vector3<f64>,

    /// Box side lengths in Angstroms
    pub size: Vector3<f64>,
}

impl BindingSite {
    /// Create a binding site, checking that the box is well formed
    pub fn new(centroid: Vector3<f64>, size: Vector3<f64>) -> Result<Self, SiteError> {
        let fields = [
            ("centroid.x", centroid.x),
            ("centroid.y", centroid.y),
            ("centroid.z", centroid.z),
            ("size.x", size.x),
            ("size.y", size.y),
            ("size.z", size.z),
        ];

        for (field, value) in fields {
            if !value.is_finite() {
                return Err(SiteError::NonFinite { field, value });
            }
        }

        for &(field, value) in &fields[3..] {
            if value <= 0.0 {
                return Err(SiteError::InvalidSize { field, value });
            }
        }

        Ok(Self { centroid, size })
    }

    /// Parse a binding site from YAML text
    pub fn from_yaml(text: &str) -> Result<Self, SiteError> {
        let site: SiteFile = serde_yaml::from_str(text)?;
        Self::new(site.centroid.into(), site.size.into())
    }

    /// Read a binding site from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SiteError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Minimum corner of the box
    pub fn min_corner(&self) -> Vector3<f64> {
        self.centroid - self.size / 2.0
    }

    /// Maximum corner of the box
    pub fn max_corner(&self) -> Vector3<f64> {
        self.centroid + self.size / 2.0
    }

    /// Volume of the box in cubic Angstroms
    pub fn volume(&self) -> f64 {
        self.size.x * self.size.y * self.size.z
    }
}
