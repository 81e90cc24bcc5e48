//! Catalog and install commands. Each handler prints human text by default or
//! pretty JSON with `--json`; failures surface as `Err` so `main` exits 1.

use {
    anyhow::bail,
    serde::Serialize,
    skillbox_skills::{
        AgentKind, Scope, SkillService,
        types::{InstallResult, RemoveResult, SkillMeta},
    },
};

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_skills(skills: &[SkillMeta]) {
    let width = skills.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for skill in skills {
        println!(
            "  {name:<width$}  {desc} [{category}]",
            name = skill.name,
            desc = skill.description,
            category = skill.category,
        );
    }
}

fn target_suffix(agent: Option<AgentKind>, scope: Option<Scope>) -> String {
    match (agent, scope) {
        (Some(agent), Some(scope)) => format!(" ({agent}, {scope})"),
        _ => String::new(),
    }
}

pub fn handle_list(service: &SkillService, category: Option<&str>, json: bool) -> anyhow::Result<()> {
    let skills = service.list(category)?;
    if json {
        return print_json(&skills);
    }
    if skills.is_empty() {
        println!("No skills found.");
        return Ok(());
    }
    print_skills(&skills);
    println!("\n{} skill(s)", skills.len());
    Ok(())
}

pub fn handle_search(service: &SkillService, query: &str, json: bool) -> anyhow::Result<()> {
    let skills = service.search(query);
    if json {
        return print_json(&skills);
    }
    if skills.is_empty() {
        println!("No skills match '{query}'.");
    } else {
        print_skills(&skills);
    }
    Ok(())
}

pub fn handle_categories(service: &SkillService, json: bool) -> anyhow::Result<()> {
    let categories = service.categories();
    if json {
        return print_json(&categories);
    }
    for c in &categories {
        println!("  {} ({})", c.name, c.count);
    }
    Ok(())
}

pub async fn handle_info(service: &SkillService, name: &str, json: bool) -> anyhow::Result<()> {
    let detail = service.info(name).await?;
    if json {
        return print_json(&detail);
    }
    let meta = &detail.meta;
    println!("{} ({})", meta.display_name, meta.name);
    println!("  {}", meta.description);
    println!("  category:  {}", meta.category);
    if !meta.tags.is_empty() {
        println!("  tags:      {}", meta.tags.join(", "));
    }
    if let Some(ref version) = meta.version {
        println!("  version:   {version}");
    }
    println!("  source:    {}", meta.source_dir.display());
    println!("  docs:      {}", detail.docs.join(", "));
    println!("  installed: {}", if detail.installed { "yes" } else { "no" });
    Ok(())
}

pub async fn handle_docs(
    service: &SkillService,
    name: &str,
    file: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let docs = service.docs(name, file).await?;
    if json {
        return print_json(&docs);
    }
    print!("{}", docs.content);
    if !docs.content.ends_with('\n') {
        println!();
    }
    Ok(())
}

pub async fn handle_requires(service: &SkillService, name: &str, json: bool) -> anyhow::Result<()> {
    let reqs = service.requirements(name).await?;
    if json {
        return print_json(&reqs);
    }
    let section = |title: &str, items: &[String]| {
        if items.is_empty() {
            println!("{title}: none");
        } else {
            println!("{title}:");
            for item in items {
                println!("  - {item}");
            }
        }
    };
    section("Environment variables", &reqs.env_vars);
    section("System dependencies", &reqs.system_deps);
    section("Package dependencies", &reqs.dependencies);
    match reqs.cli_command {
        Some(ref cmd) => println!("CLI command: {cmd}"),
        None => println!("CLI command: none"),
    }
    Ok(())
}

pub async fn handle_status(service: &SkillService, name: &str, json: bool) -> anyhow::Result<()> {
    let status = service.status(name).await?;
    if json {
        return print_json(&status);
    }
    let mark = |installed: bool| if installed { "✓" } else { "✗" };
    println!(
        "  {} source  {}",
        mark(status.installed),
        status.path.display()
    );
    for agent in &status.agents {
        let path = agent
            .path
            .as_ref()
            .map_or_else(|| "(no home directory)".to_string(), |p| p.display().to_string());
        println!(
            "  {} {:<6} {:<7} {path}",
            mark(agent.installed),
            agent.agent.as_str(),
            agent.scope.as_str(),
        );
    }
    Ok(())
}

pub async fn handle_install(
    service: &SkillService,
    name: &str,
    agent: Option<&str>,
    scope: Option<&str>,
    overwrite: bool,
    json: bool,
) -> anyhow::Result<()> {
    let report = match service.install(name, agent, scope, overwrite).await {
        Ok(report) => report,
        Err(e) if json => {
            print_json(&InstallResult::failed(name, &e))?;
            return Err(e.into());
        },
        Err(e) => return Err(e.into()),
    };

    if json {
        print_json(&report)?;
    } else {
        for r in report.results() {
            let target = target_suffix(r.agent, r.scope);
            match (&r.path, &r.error) {
                (Some(path), None) => {
                    println!("✓ Installed {}{target} → {}", r.skill, path.display());
                },
                (_, error) => eprintln!(
                    "✗ Failed to install {}{target}: {}",
                    r.skill,
                    error.as_deref().unwrap_or("unknown error")
                ),
            }
        }
    }

    if !report.success() {
        bail!("install of '{name}' did not complete");
    }
    Ok(())
}

pub async fn handle_remove(
    service: &SkillService,
    name: &str,
    agent: Option<&str>,
    scope: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let report = match service.remove(name, agent, scope).await {
        Ok(report) => report,
        Err(e) if json => {
            print_json(&RemoveResult::failed(name, &e))?;
            return Err(e.into());
        },
        Err(e) => return Err(e.into()),
    };

    if json {
        print_json(&report)?;
    } else {
        for r in report.results() {
            let target = target_suffix(r.agent, r.scope);
            if let Some(ref error) = r.error {
                eprintln!("✗ Failed to remove {}{target}: {error}", r.skill);
            } else if r.removed {
                println!("✓ Removed {}{target}", r.skill);
            } else {
                println!("  {}{target} was not installed", r.skill);
            }
        }
    }

    if !report.success() {
        bail!("removal of '{name}' did not complete");
    }
    Ok(())
}
