use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use crate::{
    discover::{FsSkillDiscoverer, SkillDiscoverer},
    error::{Error, Result},
    requirements::extract_requirements,
    search,
    types::{Category, CategoryCount, Requirements, SkillMeta},
    validate::validate_name,
};

/// Read-only catalog built once per process, plus the lazily filled
/// requirements cache.
pub struct Registry {
    root: PathBuf,
    /// Sorted by name, names unique.
    skills: Vec<SkillMeta>,
    by_name: HashMap<String, usize>,
    requirements: RwLock<HashMap<String, Arc<Requirements>>>,
}

impl Registry {
    /// Scan `root` and build the catalog.
    pub async fn load(root: impl Into<PathBuf>) -> Result<Self> {
        let discoverer = FsSkillDiscoverer::new(root);
        Self::from_discoverer(discoverer.root().to_path_buf(), &discoverer).await
    }

    /// Populate the registry from any discoverer.
    pub async fn from_discoverer(
        root: impl Into<PathBuf>,
        discoverer: &dyn SkillDiscoverer,
    ) -> Result<Self> {
        Ok(Self::from_skills(root, discoverer.discover().await?))
    }

    /// Build from already-parsed records. Re-sorts and drops duplicate names.
    pub fn from_skills(root: impl Into<PathBuf>, mut skills: Vec<SkillMeta>) -> Self {
        skills.sort_by(|a, b| a.name.cmp(&b.name));
        skills.dedup_by(|later, earlier| later.name == earlier.name);
        let by_name = skills
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.clone(), i))
            .collect();
        Self {
            root: root.into(),
            skills,
            by_name,
            requirements: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn skills(&self) -> &[SkillMeta] {
        &self.skills
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Validates `name` first, so an unsafe name is `InvalidName`, not
    /// `NotFound`.
    pub fn get_skill(&self, name: &str) -> Result<&SkillMeta> {
        validate_name(name)?;
        self.by_name
            .get(name)
            .map(|&i| &self.skills[i])
            .ok_or_else(|| Error::NotFound {
                name: name.to_string(),
            })
    }

    pub fn get_skills_by_category(&self, category: &str) -> Result<Vec<&SkillMeta>> {
        let wanted = Category::parse(category).ok_or_else(|| Error::UnknownCategory {
            category: category.to_string(),
        })?;
        Ok(self
            .skills
            .iter()
            .filter(|s| s.category == wanted)
            .collect())
    }

    /// Non-empty categories in enum order. Counts sum to [`Self::len`].
    pub fn list_categories(&self) -> Vec<CategoryCount> {
        Category::ALL
            .into_iter()
            .map(|category| CategoryCount {
                name: category,
                count: self.skills.iter().filter(|s| s.category == category).count(),
            })
            .filter(|c| c.count > 0)
            .collect()
    }

    pub fn search(&self, query: &str) -> Vec<&SkillMeta> {
        search::search(&self.skills, query)
    }

    /// Requirements for `name`, extracted on first request and memoized.
    /// Blocking: scans the bundle on a cache miss.
    pub fn requirements(&self, name: &str) -> Result<Arc<Requirements>> {
        let meta = self.get_skill(name)?;

        if let Some(cached) = self
            .requirements
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
        {
            return Ok(Arc::clone(cached));
        }

        let extracted = Arc::new(extract_requirements(meta));

        let mut cache = self
            .requirements
            .write()
            .unwrap_or_else(|e| e.into_inner());
        Ok(Arc::clone(
            cache.entry(name.to_string()).or_insert(extracted),
        ))
    }
}
