//! Bundle manifest parsing: `SKILL.md` frontmatter and `package.json`.

use std::path::Path;

use {serde::Deserialize, tracing::warn};

use crate::{
    error::{Context, Error, Result},
    types::{Category, SkillMeta},
    validate::validate_name,
};

pub const SKILL_MD: &str = "SKILL.md";
pub const PACKAGE_JSON: &str = "package.json";

/// YAML header of a `SKILL.md`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SkillFrontmatter {
    pub name: Option<String>,
    #[serde(alias = "displayName")]
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub tags: Option<serde_yaml::Value>,
    pub version: Option<serde_yaml::Value>,
    pub requires: DeclaredRequirements,
}

/// `requires:` block of the frontmatter.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeclaredRequirements {
    pub bins: Vec<String>,
    pub env: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackageJson {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub keywords: Vec<String>,
    pub category: Option<String>,
    pub skillbox: Option<PackageSkillbox>,
    /// String or object form; only presence matters.
    pub bin: Option<serde_json::Value>,
    pub dependencies: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PackageSkillbox {
    pub category: Option<String>,
}

impl PackageJson {
    /// `@scope/skill-image` -> `image`.
    pub fn normalized_name(&self) -> Option<String> {
        let raw = self.name.as_deref()?.trim();
        let unscoped = match raw.strip_prefix('@') {
            Some(scoped) => scoped.split_once('/').map_or(scoped, |(_, n)| n),
            None => raw,
        };
        let name = unscoped.strip_prefix("skill-").unwrap_or(unscoped);
        (!name.is_empty()).then(|| name.to_string())
    }

    pub fn has_bin(&self) -> bool {
        match &self.bin {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
            Some(serde_json::Value::Object(map)) => !map.is_empty(),
            Some(_) => true,
        }
    }
}

/// Everything readable from a bundle's two manifest files.
#[derive(Debug, Default)]
pub struct BundleManifest {
    pub frontmatter: Option<SkillFrontmatter>,
    /// `SKILL.md` text after the frontmatter block.
    pub body: String,
    pub package: Option<PackageJson>,
}

impl BundleManifest {
    pub fn is_empty(&self) -> bool {
        self.frontmatter.is_none() && self.package.is_none()
    }
}

/// Read both manifests of a bundle. Unparseable files are logged and treated
/// as absent.
pub fn read_bundle_manifest(skill_dir: &Path) -> BundleManifest {
    let mut manifest = BundleManifest::default();

    let skill_md = skill_dir.join(SKILL_MD);
    if skill_md.is_file() {
        match std::fs::read_to_string(&skill_md)
            .map_err(Error::from)
            .and_then(|content| parse_skill_md(&content))
        {
            Ok((frontmatter, body)) => {
                manifest.frontmatter = Some(frontmatter);
                manifest.body = body;
            },
            Err(e) => warn!(?skill_dir, %e, "failed to parse SKILL.md"),
        }
    }

    let package_json = skill_dir.join(PACKAGE_JSON);
    if package_json.is_file() {
        match std::fs::read_to_string(&package_json)
            .map_err(Error::from)
            .and_then(|content| Ok(serde_json::from_str::<PackageJson>(&content)?))
        {
            Ok(pkg) => manifest.package = Some(pkg),
            Err(e) => warn!(?skill_dir, %e, "failed to parse package.json"),
        }
    }

    manifest
}

/// Parse `SKILL.md` into its frontmatter and body.
pub fn parse_skill_md(content: &str) -> Result<(SkillFrontmatter, String)> {
    let (frontmatter, body) = split_frontmatter(content)?;
    let parsed = if frontmatter.is_empty() {
        SkillFrontmatter::default()
    } else {
        serde_yaml::from_str(&frontmatter).context("invalid SKILL.md frontmatter")?
    };
    Ok((parsed, body))
}

fn split_frontmatter(content: &str) -> Result<(String, String)> {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    let Some(after_open) = trimmed.strip_prefix("---") else {
        return Err(Error::message(
            "SKILL.md must start with YAML frontmatter delimited by ---",
        ));
    };

    let close_pos = after_open
        .find("\n---")
        .context("SKILL.md missing closing --- for frontmatter")?;

    let frontmatter = after_open[..close_pos].trim().to_string();
    let rest = &after_open[close_pos + 4..];
    // Drop the remainder of the closing delimiter line.
    let body = rest.split_once('\n').map_or("", |(_, b)| b).trim().to_string();
    Ok((frontmatter, body))
}

/// Build the catalog record for a bundle. Frontmatter wins field by field.
pub fn build_meta(skill_dir: &Path, manifest: &BundleManifest) -> Result<SkillMeta> {
    let fm = manifest.frontmatter.as_ref();
    let pkg = manifest.package.as_ref();

    let name = fm
        .and_then(|f| f.name.clone())
        .map(|n| n.trim().to_string())
        .or_else(|| {
            pkg.and_then(PackageJson::normalized_name)
                .filter(|n| validate_name(n).is_ok())
        })
        .or_else(|| {
            skill_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_default();
    validate_name(&name)?;

    let display_name = fm
        .and_then(|f| f.display_name.clone())
        .or_else(|| pkg.and_then(|p| p.display_name.clone()))
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| title_case(&name));

    let description = fm
        .and_then(|f| f.description.clone())
        .or_else(|| pkg.and_then(|p| p.description.clone()))
        .or_else(|| first_paragraph(&manifest.body))
        .unwrap_or_default()
        .trim()
        .to_string();

    let declared_category = fm.and_then(|f| f.category.clone()).or_else(|| {
        pkg.and_then(|p| {
            p.category
                .clone()
                .or_else(|| p.skillbox.as_ref().and_then(|s| s.category.clone()))
        })
    });
    let category = match declared_category {
        None => Category::Other,
        Some(raw) => Category::parse(&raw).unwrap_or_else(|| {
            warn!(?skill_dir, category = %raw, "unknown category, filing under Other");
            Category::Other
        }),
    };

    let mut tags = match fm.and_then(|f| f.tags.as_ref()) {
        Some(value) => tags_from_yaml(value),
        None => pkg.map(|p| p.keywords.clone()).unwrap_or_default(),
    };
    dedup_in_order(&mut tags);

    let version = fm
        .and_then(|f| f.version.as_ref())
        .and_then(yaml_scalar)
        .or_else(|| pkg.and_then(|p| p.version.clone()));

    Ok(SkillMeta {
        name,
        display_name,
        description,
        category,
        tags,
        source_dir: skill_dir.to_path_buf(),
        version,
    })
}

/// `pdf-tools` -> `Pdf Tools`.
pub fn title_case(name: &str) -> String {
    name.split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_paragraph(body: &str) -> Option<String> {
    body.split("\n\n")
        .map(str::trim)
        .find(|p| !p.is_empty() && !p.starts_with('#'))
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn tags_from_yaml(value: &serde_yaml::Value) -> Vec<String> {
    match value {
        serde_yaml::Value::Sequence(items) => items.iter().filter_map(yaml_scalar).collect(),
        serde_yaml::Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.trim().to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
    .filter(|s| !s.is_empty())
}

pub(crate) fn dedup_in_order(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}
