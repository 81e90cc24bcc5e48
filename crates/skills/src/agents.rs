//! Agent runtimes that consume generated descriptors, and where each one
//! expects to find them.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Claude,
    Cursor,
    Codex,
}

impl AgentKind {
    pub const ALL: [Self; 3] = [Self::Claude, Self::Cursor, Self::Codex];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Cursor => "cursor",
            Self::Codex => "codex",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|a| a.as_str()).collect()
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownAgent {
                agent: s.to_string(),
            })
    }
}

/// `--for` value: one agent, or every agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentSelector {
    One(AgentKind),
    All,
}

impl AgentSelector {
    pub fn agents(self) -> Vec<AgentKind> {
        match self {
            Self::One(agent) => vec![agent],
            Self::All => AgentKind::ALL.to_vec(),
        }
    }
}

impl FromStr for AgentSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::One)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    #[default]
    Project,
}

impl Scope {
    pub const ALL: [Self; 2] = [Self::Global, Self::Project];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Project => "project",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "project" => Ok(Self::Project),
            _ => Err(Error::InvalidScope {
                scope: s.to_string(),
            }),
        }
    }
}

/// A concrete (agent, scope) pair parameterizing one installer call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstallTarget {
    pub agent: AgentKind,
    pub scope: Scope,
}

impl InstallTarget {
    pub fn new(agent: AgentKind, scope: Scope) -> Self {
        Self { agent, scope }
    }

    /// Every (agent, scope) combination.
    pub fn all() -> impl Iterator<Item = Self> {
        AgentKind::ALL
            .into_iter()
            .flat_map(|agent| Scope::ALL.into_iter().map(move |scope| Self { agent, scope }))
    }
}

/// Base directories the per-agent layout hangs off.
#[derive(Debug, Clone)]
pub struct AgentPaths {
    /// `global` scope base; `None` when no home directory can be determined.
    pub home: Option<PathBuf>,
    /// `project` scope base.
    pub project: PathBuf,
}

impl AgentPaths {
    fn base(&self, scope: Scope) -> Option<&Path> {
        match scope {
            Scope::Global => self.home.as_deref(),
            Scope::Project => Some(&self.project),
        }
    }

    /// What removal deletes: the per-skill directory for claude/codex, the
    /// rule file itself for cursor.
    pub fn install_root(&self, target: InstallTarget, name: &str) -> Option<PathBuf> {
        let base = self.base(target.scope)?;
        Some(match target.agent {
            AgentKind::Claude => base.join(".claude").join("skills").join(name),
            AgentKind::Cursor => base
                .join(".cursor")
                .join("rules")
                .join(format!("{name}.mdc")),
            AgentKind::Codex => base.join(".codex").join("skills").join(name),
        })
    }

    /// The descriptor file written for `target`.
    pub fn descriptor_path(&self, target: InstallTarget, name: &str) -> Option<PathBuf> {
        let root = self.install_root(target, name)?;
        Some(match target.agent {
            AgentKind::Claude | AgentKind::Codex => root.join("SKILL.md"),
            AgentKind::Cursor => root,
        })
    }
}
