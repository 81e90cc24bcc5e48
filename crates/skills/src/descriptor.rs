//! Descriptor synthesis for agent-targeted installs.

use std::fmt::Write as _;

use serde::Serialize;

use crate::{
    agents::AgentKind,
    error::Result,
    parse::read_bundle_manifest,
    types::{Requirements, SkillMeta},
};

/// Maximum number of documentation lines copied into a descriptor.
const DOC_EXCERPT_LINES: usize = 60;

/// Produces the single file an agent runtime reads for a skill.
pub trait Synthesize: Send + Sync {
    fn synthesize(
        &self,
        meta: &SkillMeta,
        requirements: &Requirements,
        agent: AgentKind,
    ) -> Result<String>;
}

/// Frontmatter plus a markdown body summarizing the skill, with an excerpt
/// of its `SKILL.md` body.
#[derive(Debug, Default, Clone, Copy)]
pub struct DescriptorSynthesizer;

#[derive(Serialize)]
struct SkillFrontmatter<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CursorRuleFrontmatter<'a> {
    description: &'a str,
    globs: &'a str,
    always_apply: bool,
}

impl Synthesize for DescriptorSynthesizer {
    fn synthesize(
        &self,
        meta: &SkillMeta,
        requirements: &Requirements,
        agent: AgentKind,
    ) -> Result<String> {
        let description = if meta.description.is_empty() {
            meta.display_name.as_str()
        } else {
            meta.description.as_str()
        };
        let frontmatter = match agent {
            AgentKind::Claude | AgentKind::Codex => serde_yaml::to_string(&SkillFrontmatter {
                name: &meta.name,
                description,
            })?,
            AgentKind::Cursor => serde_yaml::to_string(&CursorRuleFrontmatter {
                description,
                globs: "",
                always_apply: false,
            })?,
        };

        let excerpt = doc_excerpt(meta);
        Ok(format!(
            "---\n{frontmatter}---\n\n{}",
            render_body(meta, requirements, excerpt.as_deref())
        ))
    }
}

fn render_body(meta: &SkillMeta, reqs: &Requirements, excerpt: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", meta.display_name);
    if !meta.description.is_empty() {
        let _ = writeln!(out, "{}\n", meta.description);
    }
    let _ = writeln!(out, "- **Category:** {}", meta.category);
    if !meta.tags.is_empty() {
        let _ = writeln!(out, "- **Tags:** {}", meta.tags.join(", "));
    }
    if let Some(version) = &meta.version {
        let _ = writeln!(out, "- **Version:** {version}");
    }
    let _ = writeln!(out, "- **Source:** `{}`", meta.source_dir.display());

    let has_requirements =
        !(reqs.env_vars.is_empty() && reqs.system_deps.is_empty() && reqs.dependencies.is_empty());
    if has_requirements {
        out.push_str("\n## Requirements\n\n");
        write_list(&mut out, "Environment variables", &reqs.env_vars);
        write_list(&mut out, "System dependencies", &reqs.system_deps);
        write_list(&mut out, "Packages", &reqs.dependencies);
    }

    if let Some(cmd) = &reqs.cli_command {
        let _ = write!(
            out,
            "\n## Usage\n\nRun `{cmd}` from the skill directory, or `{cmd} --help` for options.\n"
        );
    }

    if let Some(excerpt) = excerpt {
        let _ = write!(out, "\n## Documentation\n\n{excerpt}\n");
    }
    out
}

fn write_list(out: &mut String, label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let quoted: Vec<_> = items.iter().map(|i| format!("`{i}`")).collect();
    let _ = writeln!(out, "- {label}: {}", quoted.join(", "));
}

/// First lines of the `SKILL.md` body, headings demoted one level.
fn doc_excerpt(meta: &SkillMeta) -> Option<String> {
    let manifest = read_bundle_manifest(&meta.source_dir);
    let body = manifest.body.trim();
    if body.is_empty() {
        return None;
    }
    let lines: Vec<String> = body
        .lines()
        .take(DOC_EXCERPT_LINES)
        .map(|line| {
            if line.starts_with('#') {
                format!("#{line}")
            } else {
                line.to_string()
            }
        })
        .collect();
    Some(lines.join("\n"))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{parse::parse_skill_md, types::Category},
        std::path::PathBuf,
    };

    fn meta(dir: PathBuf) -> SkillMeta {
        SkillMeta {
            name: "image".into(),
            display_name: "Image".into(),
            description: "Generate images: fast & cheap".into(),
            category: Category::ContentGeneration,
            tags: vec!["ai".into(), "art".into()],
            source_dir: dir,
            version: Some("1.0.0".into()),
        }
    }

    fn reqs() -> Requirements {
        Requirements {
            env_vars: vec!["OPENAI_API_KEY".into()],
            system_deps: Vec::new(),
            dependencies: vec!["openai".into()],
            cli_command: Some("skill-image".into()),
        }
    }

    #[test]
    fn claude_descriptor_has_parseable_frontmatter() {
        let out = DescriptorSynthesizer
            .synthesize(&meta(PathBuf::from("/nonexistent/image")), &reqs(), AgentKind::Claude)
            .unwrap();
        let (fm, body) = parse_skill_md(&out).unwrap();
        assert_eq!(fm.name.as_deref(), Some("image"));
        assert_eq!(fm.description.as_deref(), Some("Generate images: fast & cheap"));
        assert!(body.starts_with("# Image"));
        assert!(body.contains("`OPENAI_API_KEY`"));
        assert!(body.contains("Run `skill-image`"));
        assert!(body.contains("**Category:** Content Generation"));
    }

    #[test]
    fn cursor_rule_frontmatter() {
        let out = DescriptorSynthesizer
            .synthesize(
                &meta(PathBuf::from("/nonexistent/image")),
                &Requirements::default(),
                AgentKind::Cursor,
            )
            .unwrap();
        assert!(out.starts_with("---\n"));
        assert!(out.contains("alwaysApply: false"));
        assert!(!out.contains("name: image"));
        assert!(!out.contains("## Requirements"));
    }

    #[test]
    fn includes_demoted_doc_excerpt() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("SKILL.md"),
            "---\nname: image\n---\n# Image\n\nCall it with a prompt.\n",
        )
        .unwrap();
        let out = DescriptorSynthesizer
            .synthesize(&meta(tmp.path().to_path_buf()), &reqs(), AgentKind::Codex)
            .unwrap();
        assert!(out.contains("## Documentation\n\n## Image\n\nCall it with a prompt."));
    }
}
