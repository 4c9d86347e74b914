//! Assembly of the smina command line

pub mod container;

use crate::properties::SminaProperties;
use crate::site::BindingSite;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when building an invocation
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Cannot quote command for the shell: {0}")]
    Quote(#[from] shlex::QuoteError),

    #[error("Unsupported container runtime: {0}")]
    UnsupportedRuntime(String),

    #[error("Executable {name} not found: {source}")]
    BinaryNotFound {
        name: String,
        #[source]
        source: which::Error,
    },
}

/// File locations as seen by the smina process
#[derive(Debug, Clone)]
pub struct CommandPaths {
    pub ligands: String,
    pub receptor: String,
    pub output_sdf: String,
}

/// The smina argument vector, program name first
#[derive(Debug, Clone, PartialEq)]
pub struct SminaCommand {
    argv: Vec<String>,
}

impl SminaCommand {
    /// Build the argument vector for one docking run
    pub fn build(
        properties: &SminaProperties,
        seed: i64,
        site: &BindingSite,
        paths: &CommandPaths,
    ) -> Self {
        let mut argv = vec![properties.binary_path.clone()];
        let mut flag = |name: &str, value: String| {
            argv.push(format!("--{}", name));
            argv.push(value);
        };

        flag("ligand", paths.ligands.clone());
        flag("receptor", paths.receptor.clone());
        flag("cpu", properties.cpu.to_string());
        flag("exhaustiveness", properties.exhaustiveness.to_string());
        flag("num_modes", properties.num_modes.to_string());
        flag("center_x", site.centroid.x.to_string());
        flag("center_y", site.centroid.y.to_string());
        flag("center_z", site.centroid.z.to_string());
        flag("size_x", site.size.x.to_string());
        flag("size_y", site.size.y.to_string());
        flag("size_z", site.size.z.to_string());
        flag("scoring", properties.scoring.clone());
        flag("seed", seed.to_string());
        flag("min_rmsd_filter", properties.min_rmsd_filter.to_string());
        flag("energy_range", properties.energy_range.to_string());
        flag("out", paths.output_sdf.clone());
        flag("verbosity", "1".to_string());

        Self { argv }
    }

    /// Full argument vector, program name first
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Render as a shell command with stdout redirected to `log`
    pub fn to_shell(&self, log: &str) -> Result<String, CommandError> {
        let command = shlex::try_join(self.argv.iter().map(String::as_str))?;
        Ok(format!("{} > {}", command, shlex::try_quote(log)?))
    }

    /// Run the command directly, redirecting stdout to `log`
    pub fn into_local(self, log: PathBuf) -> Invocation {
        let mut argv = self.argv.into_iter();
        let program = argv.next().unwrap_or_default();
        Invocation {
            program,
            args: argv.collect(),
            stdout: Some(log),
        }
    }
}

/// A fully resolved process launch
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,

    /// File that receives the process stdout; `None` when the command redirects itself
    pub stdout: Option<PathBuf>,
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let words = std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str));
        match shlex::try_join(words) {
            Ok(joined) => f.write_str(&joined)?,
            Err(_) => write!(f, "{} {}", self.program, self.args.join(" "))?,
        }
        if let Some(log) = &self.stdout {
            write!(f, " > {}", log.display())?;
        }
        Ok(())
    }
}

/// Locate an executable by name on `PATH`, or check it directly when given a path
pub fn resolve_binary(name: &str) -> Result<PathBuf, CommandError> {
    which::which(name).map_err(|source| CommandError::BinaryNotFound {
        name: name.to_string(),
        source,
    })
}
