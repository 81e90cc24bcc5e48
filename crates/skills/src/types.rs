use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::agents::{AgentKind, Scope};

// ── Categories ───────────────────────────────────────────────────────────────

/// Fixed set of catalog categories. Serialized as the display string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Content Generation")]
    ContentGeneration,
    #[serde(rename = "Data & Analysis")]
    DataAnalysis,
    Development,
    Productivity,
    Research,
    Communication,
    Media,
    Utilities,
    Other,
}

impl Category {
    pub const ALL: [Self; 9] = [
        Self::ContentGeneration,
        Self::DataAnalysis,
        Self::Development,
        Self::Productivity,
        Self::Research,
        Self::Communication,
        Self::Media,
        Self::Utilities,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ContentGeneration => "Content Generation",
            Self::DataAnalysis => "Data & Analysis",
            Self::Development => "Development",
            Self::Productivity => "Productivity",
            Self::Research => "Research",
            Self::Communication => "Communication",
            Self::Media => "Media",
            Self::Utilities => "Utilities",
            Self::Other => "Other",
        }
    }

    /// Kebab-case form: `Data & Analysis` -> `data-analysis`.
    pub fn slug(self) -> String {
        self.as_str()
            .to_ascii_lowercase()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Accepts the display string or the slug, case-insensitively.
    pub fn parse(input: &str) -> Option<Self> {
        let wanted = input.trim();
        Self::ALL.into_iter().find(|c| {
            c.as_str().eq_ignore_ascii_case(wanted) || c.slug().eq_ignore_ascii_case(wanted)
        })
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.as_str()).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Catalog records ──────────────────────────────────────────────────────────

/// One catalog entry, built once from a bundle on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillMeta {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Absolute bundle directory.
    pub source_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Runtime requirements observed in a bundle's sources and manifests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    pub env_vars: Vec<String>,
    pub system_deps: Vec<String>,
    pub dependencies: Vec<String>,
    pub cli_command: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub name: Category,
    pub count: usize,
}

/// A documentation file read from a bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDocs {
    pub skill: String,
    /// Path relative to the bundle directory.
    pub file: String,
    pub content: String,
    /// Every doc file the bundle ships, relative paths.
    pub files: Vec<String>,
}

/// `info` payload: the catalog record plus doc listing and install state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDetail {
    #[serde(flatten)]
    pub meta: SkillMeta,
    pub docs: Vec<String>,
    pub installed: bool,
}

// ── Install results ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallResult {
    pub skill: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

impl InstallResult {
    pub fn installed(skill: &str, path: PathBuf) -> Self {
        Self {
            skill: skill.to_string(),
            success: true,
            error: None,
            path: Some(path),
            agent: None,
            scope: None,
        }
    }

    pub fn failed(skill: &str, error: impl fmt::Display) -> Self {
        Self {
            skill: skill.to_string(),
            success: false,
            error: Some(error.to_string()),
            path: None,
            agent: None,
            scope: None,
        }
    }

    #[must_use]
    pub fn for_target(mut self, agent: AgentKind, scope: Scope) -> Self {
        self.agent = Some(agent);
        self.scope = Some(scope);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveResult {
    pub skill: String,
    pub success: bool,
    pub removed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

impl RemoveResult {
    pub fn removed(skill: &str, removed: bool) -> Self {
        Self {
            skill: skill.to_string(),
            success: true,
            removed,
            error: None,
            agent: None,
            scope: None,
        }
    }

    pub fn failed(skill: &str, error: impl fmt::Display) -> Self {
        Self {
            skill: skill.to_string(),
            success: false,
            removed: false,
            error: Some(error.to_string()),
            agent: None,
            scope: None,
        }
    }

    #[must_use]
    pub fn for_target(mut self, agent: AgentKind, scope: Scope) -> Self {
        self.agent = Some(agent);
        self.scope = Some(scope);
        self
    }
}

/// One result, or one per concrete agent when the selector was `all`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Report<T> {
    Single(T),
    Multi(Vec<T>),
}

pub type InstallReport = Report<InstallResult>;
pub type RemoveReport = Report<RemoveResult>;

impl<T> Report<T> {
    pub fn results(&self) -> &[T] {
        match self {
            Self::Single(r) => std::slice::from_ref(r),
            Self::Multi(rs) => rs,
        }
    }
}

impl InstallReport {
    /// True only if every contained result succeeded.
    pub fn success(&self) -> bool {
        self.results().iter().all(|r| r.success)
    }
}

impl RemoveReport {
    pub fn success(&self) -> bool {
        self.results().iter().all(|r| r.success)
    }
}

// ── Install status ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInstallState {
    pub agent: AgentKind,
    pub scope: Scope,
    pub installed: bool,
    pub path: Option<PathBuf>,
}

/// Where a skill is currently installed, derived from the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallStatus {
    pub skill: String,
    pub installed: bool,
    pub path: PathBuf,
    pub agents: Vec<AgentInstallState>,
}
