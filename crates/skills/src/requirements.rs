//! Static requirements extraction.
//!
//! This reports requirements *observed so far* in a bundle's sources: env
//! var reads, declared package dependencies and spawned system binaries
//! drawn from a fixed vocabulary. It is an approximation and never fails;
//! unreadable or oversized files are skipped.

use std::{path::Path, sync::LazyLock};

use {
    regex::Regex,
    tracing::{debug, trace},
    walkdir::WalkDir,
};

use crate::{
    parse::{BundleManifest, dedup_in_order, read_bundle_manifest},
    types::{Requirements, SkillMeta},
};

const SCANNED_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "ts", "mts", "tsx", "jsx", "py", "sh"];

const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "__pycache__",
    ".venv",
    "venv",
    "target",
    "dist",
    "build",
    ".next",
];

const CLI_ENTRY_POINTS: &[&str] = &["cli.js", "cli.mjs", "cli.ts", "cli.py"];

const MAX_SCAN_BYTES: u64 = 1024 * 1024;

/// Spawned program name -> reported dependency.
const SYSTEM_BINARIES: &[(&str, &str)] = &[
    ("ffmpeg", "ffmpeg"),
    ("ffprobe", "ffprobe"),
    ("convert", "imagemagick"),
    ("magick", "imagemagick"),
    ("git", "git"),
    ("docker", "docker"),
    ("curl", "curl"),
    ("wget", "wget"),
    ("pandoc", "pandoc"),
    ("yt-dlp", "yt-dlp"),
    ("sox", "sox"),
    ("tesseract", "tesseract"),
    ("jq", "jq"),
    ("gh", "gh"),
    ("python3", "python3"),
    ("python", "python3"),
    ("node", "node"),
    ("chromium", "chromium"),
    ("chromium-browser", "chromium"),
    ("libreoffice", "libreoffice"),
    ("soffice", "libreoffice"),
    ("pdftotext", "pdftotext"),
];

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("requirements pattern is a valid literal")
}

static ENV_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"process\.env\.([A-Za-z_][A-Za-z0-9_]*)",
        r#"process\.env\[\s*["']([A-Za-z_][A-Za-z0-9_]*)["']\s*\]"#,
        r#"Deno\.env\.get\(\s*["']([A-Za-z_][A-Za-z0-9_]*)["']"#,
        r#"os\.environ\[\s*["']([A-Za-z_][A-Za-z0-9_]*)["']\s*\]"#,
        r#"os\.environ\.get\(\s*["']([A-Za-z_][A-Za-z0-9_]*)["']"#,
        r#"os\.getenv\(\s*["']([A-Za-z_][A-Za-z0-9_]*)["']"#,
    ]
    .into_iter()
    .map(compile)
    .collect()
});

static SHELL_ENV: LazyLock<Regex> = LazyLock::new(|| compile(r"\$\{([A-Z_][A-Z0-9_]*)"));

/// First string argument of a process-spawning call.
static SPAWN_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"\b(?:execSync|execFileSync|execFile|exec|spawnSync|spawn|execaSync|execaCommand|execa)\s*\(\s*\[?\s*["'`]([^"'`]+)["'`]"#,
        r#"\bsubprocess\.(?:run|call|check_call|check_output|Popen)\s*\(\s*\[?\s*f?["']([^"']+)["']"#,
        r#"\bos\.system\s*\(\s*f?["']([^"']+)["']"#,
    ]
    .into_iter()
    .map(compile)
    .collect()
});

/// Scan a bundle. Declared frontmatter requirements come first.
pub fn extract_requirements(meta: &SkillMeta) -> Requirements {
    let manifest = read_bundle_manifest(&meta.source_dir);
    let mut reqs = declared(&manifest);

    reqs.dependencies.extend(
        manifest
            .package
            .iter()
            .flat_map(|p| p.dependencies.keys().cloned()),
    );
    reqs.dependencies
        .extend(python_requirements(&meta.source_dir.join("requirements.txt")));

    for path in source_files(&meta.source_dir) {
        let Ok(content) = std::fs::read_to_string(&path) else {
            trace!(path = %path.display(), "skipping unreadable file");
            continue;
        };
        let is_shell = path.extension().is_some_and(|e| e == "sh");
        reqs.env_vars.extend(env_vars_in(&content, is_shell));
        reqs.system_deps.extend(system_deps_in(&content));
    }

    dedup_in_order(&mut reqs.env_vars);
    dedup_in_order(&mut reqs.system_deps);
    dedup_in_order(&mut reqs.dependencies);

    let has_entry_point = CLI_ENTRY_POINTS
        .iter()
        .any(|f| meta.source_dir.join(f).is_file());
    if manifest.package.as_ref().is_some_and(|p| p.has_bin()) || has_entry_point {
        reqs.cli_command = Some(format!("skill-{}", meta.name));
    }

    debug!(
        skill = %meta.name,
        env_vars = reqs.env_vars.len(),
        system_deps = reqs.system_deps.len(),
        dependencies = reqs.dependencies.len(),
        "extracted requirements"
    );
    reqs
}

fn declared(manifest: &BundleManifest) -> Requirements {
    let mut reqs = Requirements::default();
    if let Some(fm) = &manifest.frontmatter {
        reqs.env_vars.extend(fm.requires.env.iter().cloned());
        reqs.system_deps.extend(fm.requires.bins.iter().cloned());
    }
    reqs
}

fn source_files(dir: &Path) -> impl Iterator<Item = std::path::PathBuf> {
    WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !EXCLUDED_DIRS.contains(&entry.file_name().to_string_lossy().as_ref())
        })
        .flatten()
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|e| SCANNED_EXTENSIONS.contains(&e.to_string_lossy().as_ref()))
        })
        .filter(|entry| entry.metadata().is_ok_and(|m| m.len() <= MAX_SCAN_BYTES))
        .map(walkdir::DirEntry::into_path)
}

/// Env var names in order of first appearance within `content`.
fn env_vars_in(content: &str, is_shell: bool) -> Vec<String> {
    let mut hits: Vec<(usize, &str)> = ENV_PATTERNS
        .iter()
        .chain(is_shell.then_some(&*SHELL_ENV))
        .flat_map(|re| re.captures_iter(content))
        .filter_map(|caps| caps.get(1))
        .map(|m| (m.start(), m.as_str()))
        .collect();
    hits.sort_by_key(|(pos, _)| *pos);
    hits.into_iter().map(|(_, name)| name.to_string()).collect()
}

fn system_deps_in(content: &str) -> Vec<String> {
    let mut hits: Vec<(usize, &'static str)> = Vec::new();
    for re in SPAWN_PATTERNS.iter() {
        for caps in re.captures_iter(content) {
            let Some(command) = caps.get(1) else { continue };
            for program in invoked_programs(command.as_str()) {
                if let Some((_, dep)) = SYSTEM_BINARIES.iter().find(|(bin, _)| *bin == program) {
                    hits.push((command.start(), dep));
                }
            }
        }
    }
    hits.sort_by_key(|(pos, _)| *pos);
    hits.into_iter().map(|(_, dep)| dep.to_string()).collect()
}

/// First word of every pipeline/sequence segment, path stripped.
fn invoked_programs(command: &str) -> Vec<&str> {
    command
        .split(['|', ';', '&'])
        .filter_map(|segment| segment.split_whitespace().next())
        .map(|word| word.rsplit('/').next().unwrap_or(word))
        .collect()
}

fn python_requirements(path: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty() && !line.starts_with('-'))
        .filter_map(|line| {
            let end = line
                .find(|c: char| "=<>!~[;@ ".contains(c))
                .unwrap_or(line.len());
            let name = line[..end].trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::types::Category,
        std::path::PathBuf,
    };

    fn meta(name: &str, dir: PathBuf) -> SkillMeta {
        SkillMeta {
            name: name.into(),
            display_name: name.into(),
            description: String::new(),
            category: Category::Other,
            tags: Vec::new(),
            source_dir: dir,
            version: None,
        }
    }

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn image_bundle_requirements() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("image");
        write(
            &dir,
            "package.json",
            r#"{"name":"skill-image","bin":{"skill-image":"cli.js"},
                "dependencies":{"openai":"^4.0.0","sharp":"^0.33.0"},
                "devDependencies":{"vitest":"^1"}}"#,
        );
        write(
            &dir,
            "src/generate.js",
            "const key = process.env.OPENAI_API_KEY;\nconst m = process.env['IMAGE_MODEL'];\nexecSync(`ffmpeg -i ${input} out.png`);\n",
        );
        write(
            &dir,
            "node_modules/openai/index.js",
            "process.env.SHOULD_NOT_APPEAR",
        );

        let reqs = extract_requirements(&meta("image", dir));
        assert_eq!(reqs.env_vars, vec!["OPENAI_API_KEY", "IMAGE_MODEL"]);
        assert_eq!(reqs.dependencies, vec!["openai", "sharp"]);
        assert_eq!(reqs.system_deps, vec!["ffmpeg"]);
        assert_eq!(reqs.cli_command.as_deref(), Some("skill-image"));
    }

    #[test]
    fn python_and_shell_idioms() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("research");
        write(
            &dir,
            "main.py",
            "import os\nA = os.environ[\"API_A\"]\nB = os.environ.get('API_B')\nC = os.getenv(\"API_C\")\nsubprocess.run([\"pandoc\", \"-o\", out])\nos.system(\"convert a.png b.jpg\")\n",
        );
        write(&dir, "run.sh", "echo ${SHELL_TOKEN}\ncurl \"$URL\"\n");
        write(&dir, "requirements.txt", "# deps\nrequests>=2.0\nbeautifulsoup4==4.12 ; python_version>'3'\n-r other.txt\n");
        write(&dir, "cli.py", "");

        let reqs = extract_requirements(&meta("research", dir));
        assert_eq!(reqs.env_vars, vec!["API_A", "API_B", "API_C", "SHELL_TOKEN"]);
        assert_eq!(reqs.system_deps, vec!["pandoc", "imagemagick"]);
        assert_eq!(reqs.dependencies, vec!["requests", "beautifulsoup4"]);
        assert_eq!(reqs.cli_command.as_deref(), Some("skill-research"));
    }

    #[test]
    fn declared_requirements_come_first_and_dedupe() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("deno-skill");
        write(
            &dir,
            "SKILL.md",
            "---\nname: deno-skill\nrequires:\n  bins: [git]\n  env: [TOKEN]\n---\n",
        );
        write(
            &dir,
            "mod.ts",
            "Deno.env.get(\"OTHER\"); Deno.env.get('TOKEN');\nspawn('git', ['status']);\n",
        );

        let reqs = extract_requirements(&meta("deno-skill", dir));
        assert_eq!(reqs.env_vars, vec!["TOKEN", "OTHER"]);
        assert_eq!(reqs.system_deps, vec!["git"]);
        assert!(reqs.dependencies.is_empty());
        assert_eq!(reqs.cli_command, None);
    }

    #[test]
    fn unknown_binaries_and_non_source_files_are_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("quiet");
        write(&dir, "a.js", "exec('my-private-tool --flag');");
        write(&dir, "notes.md", "process.env.IN_MARKDOWN");
        write(&dir, "b.js", "process.env.${NOT_SHELL}");

        let reqs = extract_requirements(&meta("quiet", dir));
        assert!(reqs.system_deps.is_empty());
        assert!(reqs.env_vars.is_empty());
    }

    #[test]
    fn missing_directory_yields_empty_requirements() {
        let reqs = extract_requirements(&meta("gone", PathBuf::from("/nonexistent/gone")));
        assert_eq!(reqs, Requirements::default());
    }

    #[test]
    fn pipelines_report_each_program() {
        assert_eq!(
            invoked_programs("/usr/bin/curl -s x | jq .name && git status"),
            vec!["curl", "jq", "git"]
        );
    }
}
