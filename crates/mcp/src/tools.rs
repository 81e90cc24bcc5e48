//! Tool catalog and dispatch.
//!
//! Tool payloads are the same JSON records the CLI prints with `--json` and
//! the HTTP API returns. Core errors become `isError` results; malformed
//! arguments are JSON-RPC `invalid params`.

use {
    serde::{Deserialize, de::DeserializeOwned},
    serde_json::{Value, json},
    skillbox_skills::{
        SkillService,
        types::{InstallResult, RemoveResult},
    },
    tracing::debug,
};

use crate::types::{JsonRpcError, McpToolDef, ToolsCallResult};

#[derive(Deserialize)]
struct ListArgs {
    #[serde(default)]
    category: Option<String>,
}

#[derive(Deserialize)]
struct SearchArgs {
    query: String,
}

#[derive(Deserialize)]
struct NameArgs {
    name: String,
}

#[derive(Deserialize)]
struct DocsArgs {
    name: String,
    #[serde(default)]
    file: Option<String>,
}

#[derive(Deserialize)]
struct InstallArgs {
    name: String,
    #[serde(default)]
    agent: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    overwrite: bool,
}

#[derive(Deserialize)]
struct RemoveArgs {
    name: String,
    #[serde(default)]
    agent: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

fn tool(name: &str, description: &str, input_schema: Value) -> McpToolDef {
    McpToolDef {
        name: name.into(),
        description: Some(description.into()),
        input_schema,
    }
}

fn name_schema() -> Value {
    json!({
        "type": "object",
        "properties": { "name": { "type": "string", "description": "Skill name" } },
        "required": ["name"]
    })
}

fn target_properties() -> Value {
    json!({
        "name": { "type": "string", "description": "Skill name" },
        "agent": {
            "type": "string",
            "enum": ["claude", "cursor", "codex", "all"],
            "description": "Write an agent descriptor instead of copying the full source"
        },
        "scope": {
            "type": "string",
            "enum": ["global", "project"],
            "description": "Descriptor location (default: project)"
        }
    })
}

pub fn tool_definitions() -> Vec<McpToolDef> {
    let mut install_props = target_properties();
    if let Some(props) = install_props.as_object_mut() {
        props.insert(
            "overwrite".into(),
            json!({ "type": "boolean", "description": "Replace an existing full-source install" }),
        );
    }

    vec![
        tool(
            "list_skills",
            "List skills in the catalog, optionally filtered by category",
            json!({
                "type": "object",
                "properties": { "category": { "type": "string" } }
            }),
        ),
        tool(
            "search_skills",
            "Search skills by name, description or tag",
            json!({
                "type": "object",
                "properties": { "query": { "type": "string" } },
                "required": ["query"]
            }),
        ),
        tool("get_skill_info", "Show a skill's catalog record", name_schema()),
        tool(
            "get_skill_docs",
            "Read a documentation file from a skill (default SKILL.md)",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "file": { "type": "string", "description": "Markdown or text doc file, relative to the skill directory" }
                },
                "required": ["name"]
            }),
        ),
        tool(
            "install_skill",
            "Install a skill's full source, or a descriptor for an agent",
            json!({ "type": "object", "properties": install_props, "required": ["name"] }),
        ),
        tool(
            "remove_skill",
            "Remove a full-source install or an agent descriptor",
            json!({ "type": "object", "properties": target_properties(), "required": ["name"] }),
        ),
        tool(
            "list_categories",
            "List categories with skill counts",
            json!({ "type": "object", "properties": {} }),
        ),
        tool(
            "get_requirements",
            "Show env vars, packages and system binaries a skill uses",
            name_schema(),
        ),
        tool(
            "get_install_status",
            "Show where a skill is currently installed",
            name_schema(),
        ),
    ]
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, JsonRpcError> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|e| JsonRpcError::invalid_params(format!("invalid arguments: {e}")))
}

fn ok_json(value: &impl serde::Serialize) -> ToolsCallResult {
    match serde_json::to_string(value) {
        Ok(text) => ToolsCallResult::text(text, false),
        Err(e) => ToolsCallResult::text(format!("failed to serialize result: {e}"), true),
    }
}

fn tool_error(error: impl std::fmt::Display) -> ToolsCallResult {
    ToolsCallResult::text(error.to_string(), true)
}

/// Run one tool. `Err` only for unknown tools and malformed arguments.
pub async fn call_tool(
    service: &SkillService,
    name: &str,
    arguments: Value,
) -> Result<ToolsCallResult, JsonRpcError> {
    debug!(tool = %name, "tools/call");
    let result = match name {
        "list_skills" => {
            let args: ListArgs = parse_args(arguments)?;
            match service.list(args.category.as_deref()) {
                Ok(skills) => ok_json(&skills),
                Err(e) => tool_error(e),
            }
        },
        "search_skills" => {
            let args: SearchArgs = parse_args(arguments)?;
            ok_json(&service.search(&args.query))
        },
        "get_skill_info" => {
            let args: NameArgs = parse_args(arguments)?;
            match service.info(&args.name).await {
                Ok(detail) => ok_json(&detail),
                Err(e) => tool_error(e),
            }
        },
        "get_skill_docs" => {
            let args: DocsArgs = parse_args(arguments)?;
            match service.docs(&args.name, args.file.as_deref()).await {
                Ok(docs) => ok_json(&docs),
                Err(e) => tool_error(e),
            }
        },
        "install_skill" => {
            let args: InstallArgs = parse_args(arguments)?;
            match service
                .install(
                    &args.name,
                    args.agent.as_deref(),
                    args.scope.as_deref(),
                    args.overwrite,
                )
                .await
            {
                Ok(report) => {
                    let mut result = ok_json(&report);
                    result.is_error = result.is_error || !report.success();
                    result
                },
                Err(e) => {
                    let mut result = ok_json(&InstallResult::failed(&args.name, e));
                    result.is_error = true;
                    result
                },
            }
        },
        "remove_skill" => {
            let args: RemoveArgs = parse_args(arguments)?;
            match service
                .remove(&args.name, args.agent.as_deref(), args.scope.as_deref())
                .await
            {
                Ok(report) => {
                    let mut result = ok_json(&report);
                    result.is_error = result.is_error || !report.success();
                    result
                },
                Err(e) => {
                    let mut result = ok_json(&RemoveResult::failed(&args.name, e));
                    result.is_error = true;
                    result
                },
            }
        },
        "list_categories" => ok_json(&service.categories()),
        "get_requirements" => {
            let args: NameArgs = parse_args(arguments)?;
            match service.requirements(&args.name).await {
                Ok(reqs) => ok_json(&reqs),
                Err(e) => tool_error(e),
            }
        },
        "get_install_status" => {
            let args: NameArgs = parse_args(arguments)?;
            match service.status(&args.name).await {
                Ok(status) => ok_json(&status),
                Err(e) => tool_error(e),
            }
        },
        other => {
            return Err(JsonRpcError::invalid_params(format!("Unknown tool: {other}")));
        },
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tool_has_an_object_schema() {
        let defs = tool_definitions();
        assert_eq!(defs.len(), 9);
        for def in &defs {
            assert_eq!(def.input_schema["type"], "object", "{}", def.name);
        }
        let install = defs.iter().find(|d| d.name == "install_skill");
        assert!(install.is_some_and(|d| d.input_schema["properties"]["overwrite"].is_object()));
    }

    #[test]
    fn null_arguments_become_empty_object() {
        let args: Result<ListArgs, _> = parse_args(Value::Null);
        assert!(args.is_ok_and(|a| a.category.is_none()));
        let missing: Result<NameArgs, _> = parse_args(json!({}));
        assert!(missing.is_err_and(|e| e.code == crate::types::INVALID_PARAMS));
    }
}
