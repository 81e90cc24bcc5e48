use std::path::PathBuf;

use skillbox_common::FromMessage;

use crate::{agents::AgentKind, types::Category};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid skill name '{name}': must match ^[a-z0-9-]+$")]
    InvalidName { name: String },

    #[error("Blocked path '{path}': {reason}")]
    Blocked { path: String, reason: String },

    #[error("Skill '{name}' not found")]
    NotFound { name: String },

    #[error("Doc file '{file}' not found for skill '{skill}'")]
    DocNotFound { skill: String, file: String },

    #[error("Unknown agent '{agent}'. Valid agents: {}, all", AgentKind::names().join(", "))]
    UnknownAgent { agent: String },

    #[error("Invalid scope '{scope}': expected 'global' or 'project'")]
    InvalidScope { scope: String },

    #[error("Unknown category '{category}'. Valid categories: {}", Category::names().join(", "))]
    UnknownCategory { category: String },

    #[error(
        "Skill '{name}' is already installed at {} (use overwrite to replace it)",
        .path.display()
    )]
    AlreadyInstalled { name: String, path: PathBuf },

    #[error("{context}: {source}")]
    Filesystem {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error("{message}")]
    Message { message: String },
}

/// How an adapter should surface an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected input; nothing was touched (HTTP 400).
    Validation,
    /// The named skill, category member or doc file does not exist (HTTP 404).
    NotFound,
    /// The request was valid but the operation did not succeed.
    Operational,
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn filesystem(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Filesystem {
            context: context.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidName { .. }
            | Self::Blocked { .. }
            | Self::UnknownAgent { .. }
            | Self::InvalidScope { .. }
            | Self::UnknownCategory { .. } => ErrorKind::Validation,
            Self::NotFound { .. } | Self::DocNotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyInstalled { .. }
            | Self::Filesystem { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Yaml(_)
            | Self::Message { .. } => ErrorKind::Operational,
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

skillbox_common::impl_context!();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_adapter_substrings() {
        let invalid = Error::InvalidName {
            name: "BAD.NAME".into(),
        };
        assert!(invalid.to_string().starts_with("Invalid"));

        let missing = Error::NotFound {
            name: "nonexistent-xyz-123".into(),
        };
        assert!(missing.to_string().contains("not found"));
    }

    #[test]
    fn unknown_agent_lists_choices() {
        let err = Error::UnknownAgent {
            agent: "vim".into(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown agent 'vim'. Valid agents: claude, cursor, codex, all"
        );
    }

    #[test]
    fn kinds_partition_the_taxonomy() {
        assert_eq!(
            Error::Blocked {
                path: "../x".into(),
                reason: "escapes".into()
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            Error::UnknownCategory {
                category: "x".into()
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            Error::DocNotFound {
                skill: "a".into(),
                file: "b".into()
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::AlreadyInstalled {
                name: "a".into(),
                path: PathBuf::from("/x/a")
            }
            .kind(),
            ErrorKind::Operational
        );
        assert_eq!(
            Error::filesystem("copy", std::io::Error::other("denied")).kind(),
            ErrorKind::Operational
        );
    }
}
