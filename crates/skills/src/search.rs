use crate::types::SkillMeta;

/// Case-insensitive substring match over name, display name, description and
/// tags. Results keep catalog order; a blank query matches nothing.
pub fn search<'a>(skills: &'a [SkillMeta], query: &str) -> Vec<&'a SkillMeta> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    skills.iter().filter(|s| matches(s, &needle)).collect()
}

fn matches(skill: &SkillMeta, needle: &str) -> bool {
    let hit = |field: &str| field.to_lowercase().contains(needle);
    hit(&skill.name)
        || hit(&skill.display_name)
        || hit(&skill.description)
        || skill.tags.iter().any(|t| hit(t))
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::types::Category,
        rstest::rstest,
        std::path::PathBuf,
    };

    fn skill(name: &str, description: &str, tags: &[&str]) -> SkillMeta {
        SkillMeta {
            name: name.into(),
            display_name: crate::parse::title_case(name),
            description: description.into(),
            category: Category::Other,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            source_dir: PathBuf::from("/skills").join(name),
            version: None,
        }
    }

    fn catalog() -> Vec<SkillMeta> {
        vec![
            skill("audio", "Transcribe recordings", &["speech"]),
            skill("image", "Generate images with DALL-E", &["ai", "art"]),
            skill("pdf-tools", "Merge and split PDFs", &["documents"]),
        ]
    }

    #[rstest]
    #[case("image", &["image"])]
    #[case("IMAGE", &["image"])]
    #[case("pdf tools", &["pdf-tools"])]
    #[case("dall-e", &["image"])]
    #[case("speech", &["audio"])]
    #[case("s", &["audio", "image", "pdf-tools"])]
    #[case("nothing-matches", &[])]
    fn finds_by_any_field(#[case] query: &str, #[case] expected: &[&str]) {
        let skills = catalog();
        let names: Vec<_> = search(&skills, query).iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\t\n")]
    fn blank_query_is_empty(#[case] query: &str) {
        assert!(search(&catalog(), query).is_empty());
    }
}
