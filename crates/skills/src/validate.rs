//! Skill name and filesystem path checks.
//!
//! Every adapter runs these before touching the filesystem; a rejection here
//! means nothing was read or written.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Credential and secret file names that are never served or written.
const BLOCKED_FILE_NAMES: &[&str] = &[
    ".env",
    "id_rsa",
    "id_dsa",
    "id_ecdsa",
    "id_ed25519",
    "authorized_keys",
    "known_hosts",
    "shadow",
    "gshadow",
    "passwd",
    "master.passwd",
    ".netrc",
    ".npmrc",
    ".pypirc",
    "credentials",
    ".git-credentials",
    ".htpasswd",
];

const BLOCKED_EXTENSIONS: &[&str] = &["pem", "key", "p12", "pfx"];

const BLOCKED_DIRS: &[&str] = &[".ssh", ".aws", ".gnupg"];

/// Check a skill identifier against `^[a-z0-9-]+$`.
pub fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidName {
            name: name.to_string(),
        })
    }
}

/// Resolve `path` under `root` and reject anything that escapes `root` or
/// names a sensitive file. Returns the resolved path on success.
///
/// Resolution is lexical; when the target already exists it is also
/// canonicalized so a symlink pointing outside `root` is caught.
pub fn validate_path(path: &str, root: &Path) -> Result<PathBuf> {
    let blocked = |reason: &str| Error::Blocked {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if path.trim().is_empty() {
        return Err(blocked("empty path"));
    }
    if path.contains('\0') {
        return Err(blocked("contains a NUL byte"));
    }

    let candidate = Path::new(path);
    if candidate.is_absolute() {
        return Err(blocked("absolute paths are not allowed"));
    }

    let root_norm = normalize(root);
    let resolved = normalize(&root_norm.join(candidate));
    if !resolved.starts_with(&root_norm) {
        return Err(blocked("path escapes the skill directory"));
    }

    if let Some(reason) = denylisted(&resolved) {
        return Err(blocked(reason));
    }

    if resolved.exists()
        && let (Ok(real), Ok(real_root)) = (resolved.canonicalize(), root_norm.canonicalize())
        && !real.starts_with(&real_root)
    {
        return Err(blocked("symlink escapes the skill directory"));
    }

    Ok(resolved)
}

/// Remove `.` and fold `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn denylisted(path: &Path) -> Option<&'static str> {
    for component in path.components() {
        if let Component::Normal(part) = component
            && BLOCKED_DIRS.iter().any(|d| part == *d)
        {
            return Some("sensitive directory");
        }
    }

    let file_name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
    if BLOCKED_FILE_NAMES.contains(&file_name.as_str()) || file_name.starts_with(".env.") {
        return Some("sensitive file");
    }

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    if ext.is_some_and(|e| BLOCKED_EXTENSIONS.contains(&e.as_str())) {
        return Some("key or certificate file");
    }
    None
}
