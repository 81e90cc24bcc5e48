use std::path::Path;

use walkdir::WalkDir;

use crate::{
    error::{Error, Result},
    parse::SKILL_MD,
    types::{SkillDocs, SkillMeta},
    validate::validate_path,
};

const DEFAULT_DOCS: &[&str] = &[SKILL_MD, "README.md"];
const DOC_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

/// Documentation files shipped in a bundle, relative to its directory:
/// `SKILL.md`, top-level `README*`, then `docs/**` markdown and text files.
pub fn list_doc_files(skill_dir: &Path) -> Vec<String> {
    let mut files = Vec::new();
    if skill_dir.join(SKILL_MD).is_file() {
        files.push(SKILL_MD.to_string());
    }

    let mut readmes: Vec<String> = std::fs::read_dir(skill_dir)
        .into_iter()
        .flatten()
        .flatten()
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.to_ascii_uppercase().starts_with("README"))
        .collect();
    readmes.sort();
    files.extend(readmes);

    let docs_dir = skill_dir.join("docs");
    let mut nested: Vec<String> = WalkDir::new(&docs_dir)
        .follow_links(false)
        .into_iter()
        .flatten()
        .filter(|e| e.file_type().is_file())
        .filter(|e| has_doc_extension(e.path()))
        .filter_map(|e| {
            e.path().strip_prefix(skill_dir).ok().map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/")
            })
        })
        .collect();
    nested.sort();
    files.extend(nested);
    files
}

fn has_doc_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|x| DOC_EXTENSIONS.contains(&x.to_string_lossy().to_ascii_lowercase().as_str()))
}

/// `README*` at any depth, or a markdown/text file.
fn is_doc_file(path: &Path) -> bool {
    let readme = path
        .file_name()
        .is_some_and(|n| n.to_string_lossy().to_ascii_uppercase().starts_with("README"));
    readme || has_doc_extension(path)
}

/// Read one doc file. `file` is checked against the bundle directory; without
/// it `SKILL.md` is used, then `README.md`.
pub fn read_doc(meta: &SkillMeta, file: Option<&str>) -> Result<SkillDocs> {
    let dir = &meta.source_dir;
    let not_found = |file: &str| Error::DocNotFound {
        skill: meta.name.clone(),
        file: file.to_string(),
    };

    let (relative, path) = match file.map(str::trim).filter(|f| !f.is_empty()) {
        Some(requested) => {
            let path = validate_path(requested, dir)?;
            if !is_doc_file(&path) {
                return Err(Error::Blocked {
                    path: requested.to_string(),
                    reason: "not a documentation file".to_string(),
                });
            }
            if !path.is_file() {
                return Err(not_found(requested));
            }
            (requested.to_string(), path)
        },
        None => DEFAULT_DOCS
            .iter()
            .map(|f| (f.to_string(), dir.join(f)))
            .find(|(_, p)| p.is_file())
            .ok_or_else(|| not_found(SKILL_MD))?,
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::filesystem(format!("failed to read {}", path.display()), e))?;

    Ok(SkillDocs {
        skill: meta.name.clone(),
        file: relative,
        content,
        files: list_doc_files(dir),
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::types::Category};

    fn bundle() -> (tempfile::TempDir, SkillMeta) {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("image");
        std::fs::create_dir_all(dir.join("docs/guides")).unwrap();
        std::fs::write(dir.join("SKILL.md"), "---\nname: image\n---\n# Image\n").unwrap();
        std::fs::write(dir.join("README.md"), "readme").unwrap();
        std::fs::write(dir.join("docs/api.md"), "api").unwrap();
        std::fs::write(dir.join("docs/guides/intro.txt"), "intro").unwrap();
        std::fs::write(dir.join("docs/diagram.png"), "png").unwrap();
        std::fs::write(dir.join(".env"), "SECRET=1").unwrap();
        std::fs::write(tmp.path().join("outside.md"), "outside").unwrap();
        let meta = SkillMeta {
            name: "image".into(),
            display_name: "Image".into(),
            description: String::new(),
            category: Category::Other,
            tags: Vec::new(),
            source_dir: dir,
            version: None,
        };
        (tmp, meta)
    }

    #[test]
    fn lists_docs_in_order() {
        let (_tmp, meta) = bundle();
        assert_eq!(list_doc_files(&meta.source_dir), vec![
            "SKILL.md",
            "README.md",
            "docs/api.md",
            "docs/guides/intro.txt"
        ]);
    }

    #[test]
    fn defaults_to_skill_md_then_readme() {
        let (_tmp, meta) = bundle();
        let docs = read_doc(&meta, None).unwrap();
        assert_eq!(docs.file, "SKILL.md");
        assert!(docs.content.contains("# Image"));
        assert_eq!(docs.files.len(), 4);

        std::fs::remove_file(meta.source_dir.join("SKILL.md")).unwrap();
        assert_eq!(read_doc(&meta, None).unwrap().file, "README.md");

        std::fs::remove_file(meta.source_dir.join("README.md")).unwrap();
        assert!(matches!(
            read_doc(&meta, None).unwrap_err(),
            Error::DocNotFound { .. }
        ));
    }

    #[test]
    fn reads_nested_file() {
        let (_tmp, meta) = bundle();
        let docs = read_doc(&meta, Some("docs/guides/intro.txt")).unwrap();
        assert_eq!(docs.content, "intro");
    }

    #[test]
    fn blocks_traversal_and_secrets() {
        let (_tmp, meta) = bundle();
        for file in ["../outside.md", ".env", "/etc/passwd"] {
            assert!(
                matches!(read_doc(&meta, Some(file)).unwrap_err(), Error::Blocked { .. }),
                "{file}"
            );
        }
    }

    #[test]
    fn refuses_non_doc_files() {
        let (_tmp, meta) = bundle();
        std::fs::create_dir_all(meta.source_dir.join("src")).unwrap();
        std::fs::write(meta.source_dir.join("src/index.js"), "code").unwrap();
        std::fs::write(meta.source_dir.join("config.json"), "{}").unwrap();
        for file in ["src/index.js", "config.json", "docs/diagram.png"] {
            let err = read_doc(&meta, Some(file)).unwrap_err();
            assert!(
                matches!(err, Error::Blocked { ref reason, .. } if reason.contains("documentation")),
                "{file}: {err}"
            );
        }
        assert_eq!(read_doc(&meta, Some("README.md")).unwrap().content, "readme");
    }

    #[test]
    fn missing_file_is_not_found() {
        let (_tmp, meta) = bundle();
        let err = read_doc(&meta, Some("docs/missing.md")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
