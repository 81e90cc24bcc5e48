//! The one facade every transport calls.
//!
//! Input validation order is fixed: skill name, then agent, then scope, then
//! catalog lookup. Validation and lookup failures are `Err`; install and
//! remove failures past that point are results with `success: false`.

use std::sync::Arc;

use tracing::debug;

use crate::{
    agents::{AgentSelector, InstallTarget, Scope},
    descriptor::{DescriptorSynthesizer, Synthesize},
    docs::{list_doc_files, read_doc},
    error::{Error, Result},
    install::Installer,
    registry::Registry,
    types::{
        CategoryCount, InstallReport, InstallStatus, RemoveReport, Report, Requirements,
        SkillDetail, SkillDocs, SkillMeta,
    },
    validate::validate_name,
};

#[derive(Clone)]
pub struct SkillService {
    registry: Arc<Registry>,
    installer: Installer,
    synthesizer: Arc<dyn Synthesize>,
}

impl SkillService {
    pub fn new(registry: Arc<Registry>, installer: Installer) -> Self {
        Self {
            registry,
            installer,
            synthesizer: Arc::new(DescriptorSynthesizer),
        }
    }

    #[must_use]
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn Synthesize>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn installer(&self) -> &Installer {
        &self.installer
    }

    pub fn list(&self, category: Option<&str>) -> Result<Vec<SkillMeta>> {
        match category {
            Some(category) => Ok(self
                .registry
                .get_skills_by_category(category)?
                .into_iter()
                .cloned()
                .collect()),
            None => Ok(self.registry.skills().to_vec()),
        }
    }

    pub fn search(&self, query: &str) -> Vec<SkillMeta> {
        self.registry.search(query).into_iter().cloned().collect()
    }

    pub fn categories(&self) -> Vec<CategoryCount> {
        self.registry.list_categories()
    }

    pub async fn info(&self, name: &str) -> Result<SkillDetail> {
        let meta = self.registry.get_skill(name)?.clone();
        let layout = self.installer.layout().clone();
        tokio::task::spawn_blocking(move || {
            let docs = list_doc_files(&meta.source_dir);
            let installed = layout.is_installed(&meta.name);
            SkillDetail {
                meta,
                docs,
                installed,
            }
        })
        .await
        .map_err(|e| Error::message(format!("info task failed: {e}")))
    }

    pub async fn docs(&self, name: &str, file: Option<&str>) -> Result<SkillDocs> {
        let meta = self.registry.get_skill(name)?.clone();
        let file = file.map(str::to_string);
        tokio::task::spawn_blocking(move || read_doc(&meta, file.as_deref()))
            .await
            .map_err(|e| Error::message(format!("docs task failed: {e}")))?
    }

    pub async fn requirements(&self, name: &str) -> Result<Requirements> {
        let registry = Arc::clone(&self.registry);
        let name = name.to_string();
        let reqs = tokio::task::spawn_blocking(move || registry.requirements(&name))
            .await
            .map_err(|e| Error::message(format!("requirements task failed: {e}")))??;
        Ok(Requirements::clone(&reqs))
    }

    pub async fn status(&self, name: &str) -> Result<InstallStatus> {
        let meta = self.registry.get_skill(name)?;
        let layout = self.installer.layout().clone();
        let name = meta.name.clone();
        tokio::task::spawn_blocking(move || layout.status(&name))
            .await
            .map_err(|e| Error::message(format!("status task failed: {e}")))
    }

    /// Without an agent this is a full-source install; with one it writes
    /// descriptors (one per agent for `all`).
    pub async fn install(
        &self,
        name: &str,
        agent: Option<&str>,
        scope: Option<&str>,
        overwrite: bool,
    ) -> Result<InstallReport> {
        validate_name(name)?;
        let (selector, scope) = parse_target(agent, scope)?;
        let meta = self.registry.get_skill(name)?;

        let Some(selector) = selector else {
            debug!(skill = %name, overwrite, "full-source install");
            let result = self.installer.install_skill(meta, overwrite).await;
            return Ok(Report::Single(result));
        };

        let requirements = self.requirements(name).await?;
        let mut results = Vec::new();
        for agent in selector.agents() {
            let target = InstallTarget::new(agent, scope);
            results.push(
                self.installer
                    .install_skill_for_agent(meta, &requirements, target, self.synthesizer.as_ref())
                    .await,
            );
        }
        Ok(report(selector, results))
    }

    /// Removal needs only a valid name, so installs of skills that have since
    /// left the catalog can still be cleaned up.
    pub async fn remove(
        &self,
        name: &str,
        agent: Option<&str>,
        scope: Option<&str>,
    ) -> Result<RemoveReport> {
        validate_name(name)?;
        let (selector, scope) = parse_target(agent, scope)?;

        let Some(selector) = selector else {
            return Ok(Report::Single(self.installer.remove_skill(name).await));
        };

        let mut results = Vec::new();
        for agent in selector.agents() {
            let target = InstallTarget::new(agent, scope);
            results.push(self.installer.remove_skill_for_agent(name, target).await);
        }
        Ok(report(selector, results))
    }
}

fn parse_target(
    agent: Option<&str>,
    scope: Option<&str>,
) -> Result<(Option<AgentSelector>, Scope)> {
    let selector = agent.map(str::parse::<AgentSelector>).transpose()?;
    let scope = scope
        .map(str::parse::<Scope>)
        .transpose()?
        .unwrap_or_default();
    Ok((selector, scope))
}

fn report<T>(selector: AgentSelector, mut results: Vec<T>) -> Report<T> {
    match selector {
        AgentSelector::One(_) if results.len() == 1 => match results.pop() {
            Some(single) => Report::Single(single),
            None => Report::Multi(results),
        },
        _ => Report::Multi(results),
    }
}
