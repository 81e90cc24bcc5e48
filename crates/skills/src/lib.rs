//! Skill catalog, requirements extraction, search, and multi-target installer.
//!
//! A skill is a directory under the catalog root containing source files, a
//! `SKILL.md` with YAML frontmatter and/or a `package.json`. The catalog is
//! loaded once per process into a [`registry::Registry`]; every transport
//! (CLI, stdio RPC, HTTP) goes through [`service::SkillService`] so they all
//! agree on results and errors.

pub mod agents;
pub mod descriptor;
pub mod discover;
pub mod docs;
pub mod error;
pub mod install;
pub mod parse;
pub mod registry;
pub mod requirements;
pub mod search;
pub mod service;
pub mod state;
pub mod types;
pub mod validate;

pub use {
    agents::{AgentKind, AgentSelector, InstallTarget, Scope},
    error::{Error, ErrorKind, Result},
    registry::Registry,
    service::SkillService,
    types::{Category, Requirements, SkillMeta},
};
