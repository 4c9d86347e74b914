//! Input/output path checks for the building block

use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Role a file plays in a docking run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    /// Ligand set to dock
    Ligands,
    /// Receptor structure
    Receptor,
    /// Binding site box
    SiteCoords,
    /// Docked poses
    OutputSdf,
    /// Captured stdout of the docking tool
    OutputLog,
}

impl FileRole {
    /// Argument name used for this file on the command line
    pub fn name(&self) -> &'static str {
        match self {
            FileRole::Ligands => "input_ligands_sdf_path",
            FileRole::Receptor => "input_receptor_pdbqt_path",
            FileRole::SiteCoords => "input_site_coords_path",
            FileRole::OutputSdf => "output_sdf_path",
            FileRole::OutputLog => "output_log_path",
        }
    }

    /// File extensions accepted for this role (lowercase, without the dot)
    pub fn accepted_formats(&self) -> &'static [&'static str] {
        match self {
            FileRole::Ligands => &["sdf"],
            FileRole::Receptor => &["pdbqt"],
            FileRole::SiteCoords => &["yml", "yaml"],
            FileRole::OutputSdf => &["sdf"],
            FileRole::OutputLog => &["log"],
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                self.accepted_formats()
                    .iter()
                    .any(|f| f.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors that can occur when checking paths
#[derive(Error, Debug)]
pub enum PathError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{role}: file {} does not exist", path.display())]
    Missing { role: FileRole, path: PathBuf },

    #[error("{role}: parent directory of {} does not exist", path.display())]
    MissingParent { role: FileRole, path: PathBuf },

    #[error("{role}: format of {} is not accepted, expected one of {accepted:?}", path.display())]
    Format {
        role: FileRole,
        path: PathBuf,
        accepted: &'static [&'static str],
    },

    #[error("{0}: path is required")]
    Required(FileRole),
}

/// Check that an input file exists and has an accepted format.
///
/// Returns the canonical absolute path.
pub fn check_input_path<P: AsRef<Path>>(path: P, role: FileRole) -> Result<PathBuf, PathError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PathError::Missing {
            role,
            path: path.to_path_buf(),
        });
    }
    check_format(path, role)?;

    let resolved = path.canonicalize()?;
    debug!("{}: {}", role, resolved.display());
    Ok(resolved)
}

/// Check that an output file can be written and has an accepted format.
///
/// `None` is only allowed for optional outputs. Returns the absolute path.
pub fn check_output_path(
    path: Option<&Path>,
    role: FileRole,
    optional: bool,
) -> Result<Option<PathBuf>, PathError> {
    let path = match path {
        Some(path) => path,
        None if optional => return Ok(None),
        None => return Err(PathError::Required(role)),
    };

    let absolute = std::path::absolute(path)?;
    let parent_exists = absolute.parent().map(Path::is_dir).unwrap_or(false);
    if !parent_exists {
        return Err(PathError::MissingParent {
            role,
            path: path.to_path_buf(),
        });
    }
    check_format(&absolute, role)?;

    debug!("{}: {}", role, absolute.display());
    Ok(Some(absolute))
}

fn check_format(path: &Path, role: FileRole) -> Result<(), PathError> {
    if role.accepts(path) {
        Ok(())
    } else {
        Err(PathError::Format {
            role,
            path: path.to_path_buf(),
            accepted: role.accepted_formats(),
        })
    }
}

/// Does the file exist with non-zero size?
pub fn is_not_empty<P: AsRef<Path>>(path: P) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}
