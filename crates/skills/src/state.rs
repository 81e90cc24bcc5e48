//! Install state, derived from the filesystem.
//!
//! [`InstallLayout`] is the only place install paths are computed; the
//! installer writes to these paths and the status checks look at them.

use std::path::PathBuf;

use crate::{
    agents::{AgentPaths, InstallTarget},
    types::{AgentInstallState, InstallStatus},
};

#[derive(Debug, Clone)]
pub struct InstallLayout {
    /// Full-source installs land in `<install_dir>/<name>`.
    pub install_dir: PathBuf,
    pub agents: AgentPaths,
}

impl InstallLayout {
    pub fn new(install_dir: impl Into<PathBuf>, agents: AgentPaths) -> Self {
        Self {
            install_dir: install_dir.into(),
            agents,
        }
    }

    pub fn source_install_path(&self, name: &str) -> PathBuf {
        self.install_dir.join(name)
    }

    pub fn descriptor_path(&self, target: InstallTarget, name: &str) -> Option<PathBuf> {
        self.agents.descriptor_path(target, name)
    }

    pub fn agent_install_root(&self, target: InstallTarget, name: &str) -> Option<PathBuf> {
        self.agents.install_root(target, name)
    }

    /// Anything at the install path counts, including a stray file or a
    /// dangling symlink, since the installer will not write over it.
    pub fn source_install_exists(&self, name: &str) -> bool {
        self.source_install_path(name).symlink_metadata().is_ok()
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.source_install_exists(name)
    }

    pub fn is_installed_for(&self, name: &str, target: InstallTarget) -> bool {
        self.descriptor_path(target, name)
            .is_some_and(|p| p.is_file())
    }

    pub fn status(&self, name: &str) -> InstallStatus {
        let agents = InstallTarget::all()
            .map(|target| {
                let path = self.descriptor_path(target, name);
                AgentInstallState {
                    agent: target.agent,
                    scope: target.scope,
                    installed: path.as_ref().is_some_and(|p| p.is_file()),
                    path,
                }
            })
            .collect();
        InstallStatus {
            skill: name.to_string(),
            installed: self.is_installed(name),
            path: self.source_install_path(name),
            agents,
        }
    }
}
