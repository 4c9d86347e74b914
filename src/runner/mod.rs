//! Launching a smina docking run: check, stage, execute, copy back

use log::{debug, error, info, warn};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

use crate::command::container::ContainerSpec;
use crate::command::{resolve_binary, CommandError, CommandPaths, Invocation, SminaCommand};
use crate::io::{check_input_path, check_output_path, is_not_empty, FileRole, PathError};
use crate::properties::{PropertiesError, SminaProperties};
use crate::sandbox::{Sandbox, SandboxError};
use crate::site::{BindingSite, SiteError};

/// Name of the staged stdout capture when no log path is requested
const DEFAULT_LOG_NAME: &str = "smina.log";

/// Errors that can occur during a run
#[derive(Error, Debug)]
pub enum SminaError {
    #[error("Binding site error: {0}")]
    Site(#[from] SiteError),

    #[error("Properties error: {0}")]
    Properties(#[from] PropertiesError),

    #[error("Path error: {0}")]
    Path(#[from] PathError),

    #[error("Sandbox error: {0}")]
    Sandbox(#[from] SandboxError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Host file locations for a run
#[derive(Debug, Clone)]
pub struct SminaPaths {
    /// Ligands to dock (SDF)
    pub input_ligands_sdf_path: PathBuf,

    /// Receptor structure (PDBQT)
    pub input_receptor_pdbqt_path: PathBuf,

    /// Binding site box (YAML)
    pub input_site_coords_path: PathBuf,

    /// Docked poses (SDF)
    pub output_sdf_path: PathBuf,

    /// Captured smina stdout
    pub output_log_path: Option<PathBuf>,
}

/// Paths after validation, all absolute
#[derive(Debug, Clone)]
struct CheckedPaths {
    ligands: PathBuf,
    receptor: PathBuf,
    output_sdf: PathBuf,
    output_log: Option<PathBuf>,
}

/// A configured smina docking run
#[derive(Debug, Clone)]
pub struct SminaRun {
    paths: SminaPaths,
    properties: SminaProperties,
    site: BindingSite,
    seed: i64,
}

impl SminaRun {
    /// Prepare a run: validate properties, read the binding site and fix the seed
    pub fn new(paths: SminaPaths, properties: SminaProperties) -> Result<Self, SminaError> {
        properties.validate()?;

        let site_path = check_input_path(&paths.input_site_coords_path, FileRole::SiteCoords)?;
        let site = BindingSite::from_file(&site_path)?;
        let (min, max) = (site.min_corner(), site.max_corner());
        debug!(
            "Search box ({}, {}, {}) to ({}, {}, {}), volume {:.1} A^3",
            min.x,
            min.y,
            min.z,
            max.x,
            max.y,
            max.z,
            site.volume()
        );

        if let Ok(json) = properties.to_json() {
            debug!("Properties: {}", json);
        }

        let seed = properties.resolve_seed();
        if properties.seed.is_none() {
            info!("No seed given, using random seed {}", seed);
        }

        Ok(Self {
            paths,
            properties,
            site,
            seed,
        })
    }

    pub fn properties(&self) -> &SminaProperties {
        &self.properties
    }

    pub fn site(&self) -> &BindingSite {
        &self.site
    }

    /// Seed passed to smina
    pub fn seed(&self) -> i64 {
        self.seed
    }

    fn check_data_params(&self) -> Result<CheckedPaths, PathError> {
        Ok(CheckedPaths {
            ligands: check_input_path(&self.paths.input_ligands_sdf_path, FileRole::Ligands)?,
            receptor: check_input_path(&self.paths.input_receptor_pdbqt_path, FileRole::Receptor)?,
            output_sdf: check_output_path(
                Some(self.paths.output_sdf_path.as_path()),
                FileRole::OutputSdf,
                false,
            )?
            .ok_or(PathError::Required(FileRole::OutputSdf))?,
            output_log: check_output_path(
                self.paths.output_log_path.as_deref(),
                FileRole::OutputLog,
                true,
            )?,
        })
    }

    /// Run smina and return its exit code.
    ///
    /// A nonzero exit code is returned as `Ok`; whatever outputs were produced
    /// are still copied back.
    pub fn launch(&self) -> Result<i32, SminaError> {
        let checked = self.check_data_params()?;

        if self.properties.restart && outputs_exist(&checked) {
            info!(
                "Restart is enabled and {} already exists, skipping",
                checked.output_sdf.display()
            );
            return Ok(0);
        }

        let container = ContainerSpec::from_properties(&self.properties)?;
        if container.is_none() {
            let binary = resolve_binary(&self.properties.binary_path)?;
            debug!("Using smina at {}", binary.display());
        }

        let mut sandbox = Sandbox::create(&self.properties.sandbox_path)?;
        let result = self.run_in_sandbox(&mut sandbox, &checked, container.as_ref());

        if self.properties.remove_tmp {
            let root = sandbox.path().to_path_buf();
            if let Err(e) = sandbox.remove() {
                warn!("Could not remove sandbox {}: {}", root.display(), e);
            }
        } else {
            info!("Keeping sandbox {}", sandbox.path().display());
        }

        let code = result?;
        check_outputs(&checked);
        Ok(code)
    }

    fn run_in_sandbox(
        &self,
        sandbox: &mut Sandbox,
        checked: &CheckedPaths,
        container: Option<&ContainerSpec>,
    ) -> Result<i32, SminaError> {
        let ligands = sandbox.stage_input(&checked.ligands)?;
        let receptor = sandbox.stage_input(&checked.receptor)?;
        let output_sdf = sandbox.stage_output(&checked.output_sdf)?;
        let output_log = match &checked.output_log {
            Some(log) => sandbox.stage_output(log)?,
            None => sandbox.stage_output(Path::new(DEFAULT_LOG_NAME))?,
        };

        let volume = container.map(|c| c.volume_path.as_str());
        let paths = CommandPaths {
            ligands: sandbox.visible_path(&ligands, volume),
            receptor: sandbox.visible_path(&receptor, volume),
            output_sdf: sandbox.visible_path(&output_sdf, volume),
        };
        let command = SminaCommand::build(&self.properties, self.seed, &self.site, &paths);

        let invocation = match container {
            Some(spec) => {
                let log = sandbox.visible_path(&output_log, volume);
                spec.wrap(&command, sandbox.path(), &log)?
            }
            None => command.into_local(output_log.clone()),
        };

        let code = execute(&invocation)?;
        if code != 0 {
            warn!("{} exited with code {}", invocation.program, code);
        }

        sandbox.copy_to_host(&output_sdf, &checked.output_sdf)?;
        if let Some(log) = &checked.output_log {
            sandbox.copy_to_host(&output_log, log)?;
        }

        Ok(code)
    }
}

/// Launch the invocation and wait for it, returning the exit code
pub fn execute(invocation: &Invocation) -> Result<i32, SminaError> {
    info!("Running: {}", invocation);

    let mut command = Command::new(&invocation.program);
    command.args(&invocation.args).stdin(Stdio::null());
    if let Some(log) = &invocation.stdout {
        command.stdout(Stdio::from(File::create(log)?));
    }

    let output = command.output().map_err(|source| SminaError::Spawn {
        program: invocation.program.clone(),
        source,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines() {
        debug!("{}", line);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stderr.lines() {
        if output.status.success() {
            debug!("{}", line);
        } else {
            error!("{}", line);
        }
    }

    // Killed by a signal
    Ok(output.status.code().unwrap_or(-1))
}

fn outputs_exist(checked: &CheckedPaths) -> bool {
    checked.output_sdf.exists()
        && checked
            .output_log
            .as_ref()
            .map(|log| log.exists())
            .unwrap_or(true)
}

fn check_outputs(checked: &CheckedPaths) {
    let outputs = std::iter::once(&checked.output_sdf).chain(checked.output_log.as_ref());
    for output in outputs {
        if !is_not_empty(output) {
            warn!("Output file {} is missing or empty", output.display());
        }
    }
}

/// Prepare and launch a run in one call
pub fn smina_run(paths: SminaPaths, properties: SminaProperties) -> Result<i32, SminaError> {
    SminaRun::new(paths, properties)?.launch()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_inputs(dir: &Path) -> SminaPaths {
        std::fs::write(dir.join("ligands.sdf"), "lig\n$$$$\n").unwrap();
        std::fs::write(dir.join("receptor.pdbqt"), "ATOM\n").unwrap();
        std::fs::write(
            dir.join("box.yml"),
            "centroid: {x: 1, y: 2, z: 3}\nsize: {x: 10, y: 10, z: 10}\n",
        )
        .unwrap();

        SminaPaths {
            input_ligands_sdf_path: dir.join("ligands.sdf"),
            input_receptor_pdbqt_path: dir.join("receptor.pdbqt"),
            input_site_coords_path: dir.join("box.yml"),
            output_sdf_path: dir.join("out.sdf"),
            output_log_path: Some(dir.join("out.log")),
        }
    }

    #[test]
    fn test_new_reads_site_and_seed() {
        let dir = tempdir().unwrap();
        let paths = write_inputs(dir.path());
        let properties = SminaProperties {
            seed: Some(99),
            ..SminaProperties::default()
        };

        let run = SminaRun::new(paths, properties).unwrap();
        assert_eq!(run.seed(), 99);
        assert_eq!(run.site().centroid.y, 2.0);
        assert_eq!(run.properties().num_modes, 9);
    }

    #[test]
    fn test_missing_site_file() {
        let dir = tempdir().unwrap();
        let mut paths = write_inputs(dir.path());
        paths.input_site_coords_path = dir.path().join("absent.yml");

        let result = SminaRun::new(paths, SminaProperties::default());
        assert!(matches!(result, Err(SminaError::Path(PathError::Missing { .. }))));
    }

    #[test]
    fn test_restart_skips_existing_outputs() {
        let dir = tempdir().unwrap();
        let paths = write_inputs(dir.path());
        std::fs::write(dir.path().join("out.sdf"), "done").unwrap();
        std::fs::write(dir.path().join("out.log"), "done").unwrap();

        let properties = SminaProperties {
            restart: true,
            binary_path: "definitely-not-a-real-smina-binary".to_string(),
            sandbox_path: dir.path().to_path_buf(),
            ..SminaProperties::default()
        };

        let code = smina_run(paths, properties).unwrap();
        assert_eq!(code, 0);
        assert_eq!(std::fs::read_to_string(dir.path().join("out.sdf")).unwrap(), "done");
    }

    #[test]
    fn test_missing_binary_is_reported_before_staging() {
        let dir = tempdir().unwrap();
        let paths = write_inputs(dir.path());
        let sandbox_parent = dir.path().join("sandboxes");
        let properties = SminaProperties {
            binary_path: "definitely-not-a-real-smina-binary".to_string(),
            sandbox_path: sandbox_parent.clone(),
            ..SminaProperties::default()
        };

        let result = smina_run(paths, properties);
        assert!(matches!(
            result,
            Err(SminaError::Command(CommandError::BinaryNotFound { .. }))
        ));
        assert!(!sandbox_parent.exists());
    }

    #[test]
    fn test_wrong_output_format() {
        let dir = tempdir().unwrap();
        let mut paths = write_inputs(dir.path());
        paths.output_sdf_path = dir.path().join("out.pdbqt");

        let result = smina_run(paths, SminaProperties::default());
        assert!(matches!(
            result,
            Err(SminaError::Path(PathError::Format {
                role: FileRole::OutputSdf,
                ..
            }))
        ));
    }
}
