/// Config schema types (catalog, install, agents, server).
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillboxConfig {
    pub catalog: CatalogConfig,
    pub install: InstallConfig,
    pub agents: AgentsConfig,
    pub server: ServerConfig,
}

impl SkillboxConfig {
    /// Make relative catalog/install/project paths absolute against `base`
    /// (normally the current working directory).
    pub fn resolve_paths(&mut self, base: &Path) {
        self.catalog.root = absolutize(base, &self.catalog.root);
        self.install.dir = absolutize(base, &self.install.dir);
        if let Some(ref dir) = self.agents.project_dir {
            self.agents.project_dir = Some(absolutize(base, dir));
        }
    }
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Where skill bundles are read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory whose immediate subdirectories are skill bundles.
    pub root: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("skills"),
        }
    }
}

/// Where full-source installs are copied to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    pub dir: PathBuf,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".skillbox/installed"),
        }
    }
}

/// Base directories for agent-targeted installs.
///
/// The per-agent layout below these bases is fixed; only the bases move
/// (mostly so tests and sandboxes never write into the real home directory).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    /// Base for `global` scope. Defaults to the user's home directory.
    pub home_dir: Option<PathBuf>,
    /// Base for `project` scope. Defaults to the current working directory.
    pub project_dir: Option<PathBuf>,
}

impl AgentsConfig {
    pub fn resolved_home_dir(&self) -> Option<PathBuf> {
        self.home_dir
            .clone()
            .or_else(|| directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()))
    }

    pub fn resolved_project_dir(&self, cwd: &Path) -> PathBuf {
        self.project_dir
            .clone()
            .unwrap_or_else(|| cwd.to_path_buf())
    }
}

/// HTTP API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "127.0.0.1".
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 3737,
        }
    }
}
