//! Full-source and agent-targeted installs, and their inverses.
//!
//! Callers validate names and resolve catalog entries first; everything here
//! reports operational failures as `success: false` results rather than
//! errors. Finalization is rename-based so a partially copied tree is never
//! visible at an install path.

use std::{
    io,
    path::{Path, PathBuf},
};

use {
    skillbox_common::fs::{remove_atomic, staging_path, write_atomic},
    tracing::{debug, info, warn},
    walkdir::WalkDir,
};

use crate::{
    agents::InstallTarget,
    descriptor::Synthesize,
    error::{Error, Result},
    state::InstallLayout,
    types::{InstallResult, RemoveResult, Requirements, SkillMeta},
};

#[derive(Debug, Clone)]
pub struct Installer {
    layout: InstallLayout,
}

impl Installer {
    pub fn new(layout: InstallLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    /// Copy the bundle to `<install_dir>/<name>`. An existing install is left
    /// alone unless `overwrite` is set.
    pub async fn install_skill(&self, meta: &SkillMeta, overwrite: bool) -> InstallResult {
        let dest = self.layout.source_install_path(&meta.name);
        let src = meta.source_dir.clone();
        let name = meta.name.clone();
        let layout = self.layout.clone();

        let outcome = tokio::task::spawn_blocking(move || {
            install_tree(&name, &src, &layout, overwrite)
        })
        .await
        .unwrap_or_else(|e| Err(Error::message(format!("install task failed: {e}"))));

        match outcome {
            Ok(()) => {
                info!(skill = %meta.name, dest = %dest.display(), "installed skill");
                InstallResult::installed(&meta.name, dest)
            },
            Err(e) => {
                warn!(skill = %meta.name, %e, "install failed");
                InstallResult::failed(&meta.name, e)
            },
        }
    }

    /// Write the synthesized descriptor for `target`, replacing any previous
    /// one.
    pub async fn install_skill_for_agent(
        &self,
        meta: &SkillMeta,
        requirements: &Requirements,
        target: InstallTarget,
        synthesizer: &dyn Synthesize,
    ) -> InstallResult {
        let result = match self.write_descriptor(meta, requirements, target, synthesizer).await {
            Ok(path) => {
                info!(
                    skill = %meta.name,
                    agent = %target.agent,
                    scope = %target.scope,
                    path = %path.display(),
                    "wrote agent descriptor"
                );
                InstallResult::installed(&meta.name, path)
            },
            Err(e) => {
                warn!(skill = %meta.name, agent = %target.agent, %e, "descriptor install failed");
                InstallResult::failed(&meta.name, e)
            },
        };
        result.for_target(target.agent, target.scope)
    }

    async fn write_descriptor(
        &self,
        meta: &SkillMeta,
        requirements: &Requirements,
        target: InstallTarget,
        synthesizer: &dyn Synthesize,
    ) -> Result<PathBuf> {
        let path = self.descriptor_path(target, &meta.name)?;
        let content = synthesizer.synthesize(meta, requirements, target.agent)?;
        let task_path = path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&task_path, content.as_bytes()))
            .await
            .map_err(|e| Error::message(format!("write task failed: {e}")))?
            .map_err(|e| Error::filesystem(format!("failed to write {}", path.display()), e))?;
        Ok(path)
    }

    /// Delete the full-source install. Absence is `removed: false`.
    pub async fn remove_skill(&self, name: &str) -> RemoveResult {
        let dest = self.layout.source_install_path(name);
        match remove_path(dest).await {
            Ok(removed) => {
                debug!(skill = %name, removed, "removed full-source install");
                RemoveResult::removed(name, removed)
            },
            Err(e) => RemoveResult::failed(name, e),
        }
    }

    /// Delete the agent descriptor (directory for claude/codex, rule file for
    /// cursor). Absence is `removed: false`.
    pub async fn remove_skill_for_agent(&self, name: &str, target: InstallTarget) -> RemoveResult {
        let result = match self.layout.agent_install_root(target, name) {
            None => RemoveResult::failed(name, no_home_error(target)),
            Some(root) => match remove_path(root).await {
                Ok(removed) => {
                    debug!(
                        skill = %name,
                        agent = %target.agent,
                        scope = %target.scope,
                        removed,
                        "removed agent descriptor"
                    );
                    RemoveResult::removed(name, removed)
                },
                Err(e) => RemoveResult::failed(name, e),
            },
        };
        result.for_target(target.agent, target.scope)
    }

    fn descriptor_path(&self, target: InstallTarget, name: &str) -> Result<PathBuf> {
        self.layout
            .descriptor_path(target, name)
            .ok_or_else(|| no_home_error(target))
    }
}

fn no_home_error(target: InstallTarget) -> Error {
    Error::message(format!(
        "cannot resolve {} {} directory: no home directory",
        target.agent, target.scope
    ))
}

async fn remove_path(path: PathBuf) -> Result<bool> {
    let task_path = path.clone();
    tokio::task::spawn_blocking(move || remove_atomic(&task_path))
        .await
        .map_err(|e| Error::message(format!("remove task failed: {e}")))?
        .map_err(|e| Error::filesystem(format!("failed to remove {}", path.display()), e))
}

fn install_tree(name: &str, src: &Path, layout: &InstallLayout, overwrite: bool) -> Result<()> {
    let dest = layout.source_install_path(name);
    if !overwrite && layout.source_install_exists(name) {
        return Err(already_installed(name, &dest));
    }
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::filesystem(format!("failed to create {}", parent.display()), e))?;
    }

    let staged = staging_path(&dest, "staging");
    if let Err(e) = copy_dir_recursive(src, &staged) {
        let _ = std::fs::remove_dir_all(&staged);
        return Err(e);
    }

    let finalized = finalize(name, &staged, &dest, overwrite);
    if finalized.is_err() {
        let _ = std::fs::remove_dir_all(&staged);
    }
    finalized
}

fn already_installed(name: &str, dest: &Path) -> Error {
    Error::AlreadyInstalled {
        name: name.to_string(),
        path: dest.to_path_buf(),
    }
}

fn move_error(name: &str, dest: &Path, e: io::Error) -> Error {
    if dest_occupied(&e) {
        already_installed(name, dest)
    } else {
        Error::filesystem(format!("failed to move install into {}", dest.display()), e)
    }
}

/// Move `staged` into place. With `overwrite`, the previous tree is retired
/// to a hidden sibling first; it is deleted only once the new tree is in
/// place and renamed back if the move fails.
fn finalize(name: &str, staged: &Path, dest: &Path, overwrite: bool) -> Result<()> {
    if !overwrite {
        return std::fs::rename(staged, dest).map_err(|e| move_error(name, dest, e));
    }

    let retired = retire(dest)?;
    let first = match std::fs::rename(staged, dest) {
        Ok(()) => {
            discard_retired(retired);
            return Ok(());
        },
        Err(e) => e,
    };
    if !dest_occupied(&first) {
        restore_retired(retired, dest);
        return Err(move_error(name, dest, first));
    }

    // Another writer finalized between retire and rename. Its tree supersedes
    // ours as the previous install; swap once more against it.
    discard_retired(retired);
    let theirs = retire(dest)?;
    match std::fs::rename(staged, dest) {
        Ok(()) => {
            discard_retired(theirs);
            Ok(())
        },
        Err(e) => {
            restore_retired(theirs, dest);
            Err(move_error(name, dest, e))
        },
    }
}

fn retire(dest: &Path) -> Result<Option<PathBuf>> {
    let retired = staging_path(dest, "replaced");
    match std::fs::rename(dest, &retired) {
        Ok(()) => Ok(Some(retired)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::filesystem(
            format!("failed to replace {}", dest.display()),
            e,
        )),
    }
}

fn restore_retired(retired: Option<PathBuf>, dest: &Path) {
    if let Some(path) = retired
        && let Err(e) = std::fs::rename(&path, dest)
    {
        warn!(
            retired = %path.display(),
            dest = %dest.display(),
            %e,
            "failed to restore previous install"
        );
    }
}

fn discard_retired(retired: Option<PathBuf>) {
    if let Some(path) = retired
        && let Err(e) = remove_atomic(&path)
    {
        warn!(path = %path.display(), %e, "failed to delete replaced install");
    }
}

fn dest_occupied(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::AlreadyExists
            | io::ErrorKind::DirectoryNotEmpty
            | io::ErrorKind::NotADirectory
    )
}

/// Copy regular files and directories; symlinks are not followed or copied.
fn copy_dir_recursive(src: &Path, dest: &Path) -> Result<()> {
    let fs_err = |what: &str, path: &Path, e: io::Error| {
        Error::filesystem(format!("failed to {what} {}", path.display()), e)
    };

    std::fs::create_dir_all(dest).map_err(|e| fs_err("create", dest, e))?;

    for entry in WalkDir::new(src).follow_links(false).min_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| src.to_path_buf());
            fs_err("read", &path, e.into())
        })?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::message(e.to_string()))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| fs_err("create", &target, e))?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &target).map_err(|e| fs_err("copy", entry.path(), e))?;
        } else {
            debug!(path = %entry.path().display(), "skipping non-regular file");
        }
    }

    Ok(())
}
