//! Wrapping the smina command in a container runtime

use super::{CommandError, Invocation, SminaCommand};
use crate::properties::SminaProperties;
use log::warn;
use std::path::Path;

/// Supported container runtimes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerRuntime {
    Docker,
    Podman,
    /// Singularity or Apptainer
    Singularity,
}

impl ContainerRuntime {
    /// Infer the runtime from the file name of its executable
    pub fn detect(container_path: &str) -> Result<Self, CommandError> {
        let name = Path::new(container_path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(container_path)
            .to_lowercase();

        if name.contains("docker") {
            Ok(ContainerRuntime::Docker)
        } else if name.contains("podman") {
            Ok(ContainerRuntime::Podman)
        } else if name.contains("singularity") || name.contains("apptainer") {
            Ok(ContainerRuntime::Singularity)
        } else {
            Err(CommandError::UnsupportedRuntime(container_path.to_string()))
        }
    }
}

/// Container settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSpec {
    pub runtime: ContainerRuntime,
    pub executable: String,
    pub image: String,
    pub volume_path: String,
    pub working_dir: Option<String>,
    pub user_id: Option<String>,
    pub shell_path: String,
}

impl ContainerSpec {
    /// Container settings from properties, or `None` for a local run
    pub fn from_properties(properties: &SminaProperties) -> Result<Option<Self>, CommandError> {
        let executable = match &properties.container_path {
            Some(path) => path.clone(),
            None => return Ok(None),
        };

        Ok(Some(Self {
            runtime: ContainerRuntime::detect(&executable)?,
            executable,
            image: properties.container_image.clone(),
            volume_path: properties.container_volume_path.clone(),
            working_dir: properties.container_working_dir.clone(),
            user_id: properties.container_user_id.clone(),
            shell_path: properties.container_shell_path.clone(),
        }))
    }

    /// Wrap `command` so it runs inside the container with `host_dir` mounted
    /// at the volume path. `log` is the container-side path for stdout.
    pub fn wrap(
        &self,
        command: &SminaCommand,
        host_dir: &Path,
        log: &str,
    ) -> Result<Invocation, CommandError> {
        let mount = format!("{}:{}", host_dir.display(), self.volume_path);
        let mut args = Vec::new();

        match self.runtime {
            ContainerRuntime::Docker | ContainerRuntime::Podman => {
                args.push("run".to_string());
                args.push("--rm".to_string());
                if let Some(user) = &self.user_id {
                    args.push("--user".to_string());
                    args.push(user.clone());
                }
                args.push("-v".to_string());
                args.push(mount);
                if let Some(dir) = &self.working_dir {
                    args.push("-w".to_string());
                    args.push(dir.clone());
                }
            }
            ContainerRuntime::Singularity => {
                args.push("exec".to_string());
                if self.user_id.is_some() {
                    warn!("container_user_id is ignored by Singularity");
                }
                args.push("--bind".to_string());
                args.push(mount);
                if let Some(dir) = &self.working_dir {
                    args.push("--pwd".to_string());
                    args.push(dir.clone());
                }
            }
        }

        args.push(self.image.clone());
        args.push(self.shell_path.clone());
        args.push("-c".to_string());
        args.push(command.to_shell(log)?);

        Ok(Invocation {
            program: self.executable.clone(),
            args,
            stdout: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandPaths;
    use crate::site::BindingSite;
    use nalgebra::Vector3;

    fn command() -> SminaCommand {
        let site = BindingSite::new(Vector3::zeros(), Vector3::new(10.0, 10.0, 10.0)).unwrap();
        let paths = CommandPaths {
            ligands: "/tmp/ligands.sdf".to_string(),
            receptor: "/tmp/receptor.pdbqt".to_string(),
            output_sdf: "/tmp/out.sdf".to_string(),
        };
        SminaCommand::build(&SminaProperties::default(), 5, &site, &paths)
    }

    #[test]
    fn test_detect_runtime() {
        assert_eq!(
            ContainerRuntime::detect("/usr/bin/docker").unwrap(),
            ContainerRuntime::Docker
        );
        assert_eq!(
            ContainerRuntime::detect("podman").unwrap(),
            ContainerRuntime::Podman
        );
        assert_eq!(
            ContainerRuntime::detect("/opt/apptainer").unwrap(),
            ContainerRuntime::Singularity
        );
        assert!(matches!(
            ContainerRuntime::detect("/usr/bin/lxc"),
            Err(CommandError::UnsupportedRuntime(_))
        ));
    }

    #[test]
    fn test_local_run_has_no_spec() {
        let spec = ContainerSpec::from_properties(&SminaProperties::default()).unwrap();
        assert!(spec.is_none());
    }

    #[test]
    fn test_docker_wrap() {
        let properties = SminaProperties {
            container_path: Some("docker".to_string()),
            container_user_id: Some("1000".to_string()),
            container_working_dir: Some("/tmp".to_string()),
            ..SminaProperties::default()
        };
        let spec = ContainerSpec::from_properties(&properties).unwrap().unwrap();
        let invocation = spec
            .wrap(&command(), Path::new("/host/sandbox_1"), "/tmp/out.log")
            .unwrap();

        assert_eq!(invocation.program, "docker");
        assert_eq!(invocation.stdout, None);
        assert_eq!(
            &invocation.args[..9],
            &[
                "run",
                "--rm",
                "--user",
                "1000",
                "-v",
                "/host/sandbox_1:/tmp",
                "-w",
                "/tmp",
                crate::properties::DEFAULT_CONTAINER_IMAGE,
            ]
        );
        assert_eq!(invocation.args[9], "/bin/bash");
        assert_eq!(invocation.args[10], "-c");
        assert!(invocation.args[11].starts_with("smina --ligand /tmp/ligands.sdf"));
        assert!(invocation.args[11].ends_with("> /tmp/out.log"));
    }

    #[test]
    fn test_singularity_wrap() {
        let properties = SminaProperties {
            container_path: Some("singularity".to_string()),
            container_image: "smina.sif".to_string(),
            container_volume_path: "/data".to_string(),
            ..SminaProperties::default()
        };
        let spec = ContainerSpec::from_properties(&properties).unwrap().unwrap();
        let invocation = spec
            .wrap(&command(), Path::new("/host/sb"), "/data/out.log")
            .unwrap();

        assert_eq!(invocation.program, "singularity");
        assert_eq!(
            &invocation.args[..5],
            &["exec", "--bind", "/host/sb:/data", "smina.sif", "/bin/bash"]
        );
    }
}
