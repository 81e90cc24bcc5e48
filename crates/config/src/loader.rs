use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    env_subst::substitute_env,
    error::{Context, Error, Result},
    schema::SkillboxConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "skillbox.toml",
    "skillbox.yaml",
    "skillbox.yml",
    "skillbox.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<SkillboxConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./skillbox.{toml,yaml,yml,json}` (project-local)
/// 2. `<user config dir>/skillbox.{toml,yaml,yml,json}` (user-global)
///
/// Returns `SkillboxConfig::default()` if no config file is found or the
/// file fails to parse (with a warning).
pub fn discover_and_load() -> SkillboxConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    SkillboxConfig::default()
}

fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/skillbox/` on Linux).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "skillbox").map(|d| d.config_dir().to_path_buf())
}

/// Apply `SKILLBOX_*` environment overrides on top of file values.
pub fn apply_env_overrides(config: &mut SkillboxConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut SkillboxConfig, lookup: impl Fn(&str) -> Option<String>) {
    let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(root) = non_empty("SKILLBOX_SKILLS_ROOT") {
        config.catalog.root = PathBuf::from(root);
    }
    if let Some(dir) = non_empty("SKILLBOX_INSTALL_DIR") {
        config.install.dir = PathBuf::from(dir);
    }
    if let Some(home) = non_empty("SKILLBOX_AGENT_HOME") {
        config.agents.home_dir = Some(PathBuf::from(home));
    }
    if let Some(project) = non_empty("SKILLBOX_PROJECT_DIR") {
        config.agents.project_dir = Some(PathBuf::from(project));
    }
    if let Some(bind) = non_empty("SKILLBOX_BIND") {
        config.server.bind = bind;
    }
    if let Some(port) = non_empty("SKILLBOX_PORT") {
        match port.trim().parse() {
            Ok(port) => config.server.port = port,
            Err(e) => warn!(%port, error = %e, "ignoring invalid SKILLBOX_PORT"),
        }
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<SkillboxConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => Err(Error::message(format!("unsupported config format: .{ext}"))),
    }
}
