use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use {
    async_trait::async_trait,
    tracing::{debug, info, warn},
};

use crate::{
    error::{Error, Result},
    parse::{build_meta, read_bundle_manifest},
    types::SkillMeta,
};

/// Produces the catalog.
#[async_trait]
pub trait SkillDiscoverer: Send + Sync {
    /// Return every valid bundle, sorted by name, names unique.
    async fn discover(&self) -> Result<Vec<SkillMeta>>;
}

/// Scans the immediate subdirectories of a single catalog root.
pub struct FsSkillDiscoverer {
    root: PathBuf,
}

impl FsSkillDiscoverer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl SkillDiscoverer for FsSkillDiscoverer {
    async fn discover(&self) -> Result<Vec<SkillMeta>> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || load_catalog(&root))
            .await
            .map_err(|e| Error::message(format!("catalog scan task failed: {e}")))?
    }
}

/// Synchronous catalog scan. A missing root yields an empty catalog.
pub fn load_catalog(root: &Path) -> Result<Vec<SkillMeta>> {
    if !root.is_dir() {
        warn!(root = %root.display(), "skills root does not exist, catalog is empty");
        return Ok(Vec::new());
    }
    let root = root
        .canonicalize()
        .map_err(|e| Error::filesystem(format!("failed to resolve {}", root.display()), e))?;

    let entries = std::fs::read_dir(&root)
        .map_err(|e| Error::filesystem(format!("failed to read {}", root.display()), e))?;
    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter(|path| {
            !path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with('.'))
        })
        .collect();
    dirs.sort();

    let mut skills = Vec::with_capacity(dirs.len());
    let mut seen = HashSet::new();
    for skill_dir in dirs {
        let manifest = read_bundle_manifest(&skill_dir);
        if manifest.is_empty() {
            warn!(?skill_dir, "no parseable SKILL.md or package.json, skipping");
            continue;
        }
        match build_meta(&skill_dir, &manifest) {
            Ok(meta) => {
                if !seen.insert(meta.name.clone()) {
                    warn!(?skill_dir, name = %meta.name, "duplicate skill name, skipping");
                    continue;
                }
                debug!(name = %meta.name, ?skill_dir, "discovered skill");
                skills.push(meta);
            },
            Err(e) => warn!(?skill_dir, %e, "skipping skill bundle"),
        }
    }

    skills.sort_by(|a, b| a.name.cmp(&b.name));
    info!(root = %root.display(), count = skills.len(), "loaded skill catalog");
    Ok(skills)
}
