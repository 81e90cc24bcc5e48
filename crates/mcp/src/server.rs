use {
    serde::{Serialize, de::DeserializeOwned},
    serde_json::Value,
    skillbox_skills::SkillService,
    tracing::{debug, info, warn},
};

use crate::{
    resources,
    tools,
    types::{
        INTERNAL_ERROR, INVALID_REQUEST, InitializeResult, JsonRpcError, JsonRpcRequest,
        JsonRpcResponse, METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION, ResourceReadParams,
        ResourceTemplatesListResult, ResourcesCapability, ResourcesListResult, ServerCapabilities,
        ServerInfo, ToolsCallParams, ToolsCapability, ToolsListResult,
    },
};

/// Routes JSON-RPC messages to the skill service.
#[derive(Clone)]
pub struct McpServer {
    service: SkillService,
}

impl McpServer {
    pub fn new(service: SkillService) -> Self {
        Self { service }
    }

    /// Handle one raw message. Returns `None` for notifications.
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "unparseable JSON-RPC message");
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    JsonRpcError::new(PARSE_ERROR, format!("Parse error: {e}")),
                ));
            },
        };

        let request: JsonRpcRequest = match serde_json::from_value(value.clone()) {
            Ok(r) => r,
            Err(e) => {
                let id = value.get("id").cloned().unwrap_or(Value::Null);
                return Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::new(INVALID_REQUEST, format!("Invalid request: {e}")),
                ));
            },
        };

        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "notification");
            return None;
        };

        debug!(method = %request.method, %id, "client -> server");
        Some(match self.dispatch(&request.method, request.params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value, JsonRpcError> {
        match method {
            "initialize" => {
                info!("client initialized session");
                to_value(&InitializeResult {
                    protocol_version: PROTOCOL_VERSION.into(),
                    capabilities: ServerCapabilities {
                        tools: Some(ToolsCapability::default()),
                        resources: Some(ResourcesCapability::default()),
                    },
                    server_info: ServerInfo {
                        name: "skillbox".into(),
                        version: Some(env!("CARGO_PKG_VERSION").into()),
                    },
                    instructions: Some(
                        "Browse, inspect and install local skills. Start with list_skills or search_skills."
                            .into(),
                    ),
                })
            },
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => to_value(&ToolsListResult {
                tools: tools::tool_definitions(),
            }),
            "tools/call" => {
                let params: ToolsCallParams = parse_params(params)?;
                let result = tools::call_tool(&self.service, &params.name, params.arguments).await?;
                to_value(&result)
            },
            "resources/list" => to_value(&ResourcesListResult {
                resources: resources::list_resources(&self.service),
            }),
            "resources/templates/list" => to_value(&ResourceTemplatesListResult {
                resource_templates: resources::resource_templates(),
            }),
            "resources/read" => {
                let params: ResourceReadParams = parse_params(params)?;
                let result = resources::read_resource(&self.service, &params.uri).await?;
                to_value(&result)
            },
            other => Err(JsonRpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            )),
        }
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::invalid_params("missing params"))?;
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("invalid params: {e}")))
}

fn to_value(value: &impl Serialize) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        serde_json::json,
        skillbox_skills::{
            Registry,
            agents::AgentPaths,
            install::Installer,
            state::InstallLayout,
        },
        std::{path::Path, sync::Arc},
    };

    async fn server(tmp: &Path) -> McpServer {
        let image = tmp.join("skills/image");
        std::fs::create_dir_all(&image).unwrap();
        std::fs::write(
            image.join("SKILL.md"),
            "---\nname: image\ndescription: Generate images\ncategory: Content Generation\n---\n# Image\n",
        )
        .unwrap();
        std::fs::write(image.join("cli.js"), "process.env.OPENAI_API_KEY").unwrap();

        let registry = Registry::load(tmp.join("skills")).await.unwrap();
        let layout = InstallLayout::new(
            tmp.join("installed"),
            AgentPaths {
                home: Some(tmp.join("home")),
                project: tmp.join("proj"),
            },
        );
        McpServer::new(SkillService::new(Arc::new(registry), Installer::new(layout)))
    }

    async fn call(server: &McpServer, msg: Value) -> Value {
        let resp = server.handle_message(&msg.to_string()).await.unwrap();
        serde_json::to_value(resp).unwrap()
    }

    async fn call_tool(server: &McpServer, name: &str, arguments: Value) -> (bool, String) {
        let resp = call(
            server,
            json!({"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":name,"arguments":arguments}}),
        )
        .await;
        let result = &resp["result"];
        (
            result["isError"].as_bool().unwrap(),
            result["content"][0]["text"].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn initialize_and_list_tools() {
        let tmp = tempfile::tempdir().unwrap();
        let s = server(tmp.path()).await;

        let init = call(&s, json!({"jsonrpc":"2.0","id":1,"method":"initialize","params":{}})).await;
        assert_eq!(init["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(init["result"]["serverInfo"]["name"], "skillbox");

        let notif = s
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(notif.is_none());

        let tools = call(&s, json!({"jsonrpc":"2.0","id":2,"method":"tools/list"})).await;
        let names: Vec<_> = tools["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        assert!(names.contains(&"get_install_status".to_string()));
        assert_eq!(names.len(), 9);
    }

    #[tokio::test]
    async fn protocol_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let s = server(tmp.path()).await;

        let parse = s.handle_message("{not json").await.unwrap();
        assert_eq!(parse.error.unwrap().code, PARSE_ERROR);

        let unknown = call(&s, json!({"jsonrpc":"2.0","id":3,"method":"bogus"})).await;
        assert_eq!(unknown["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(unknown["id"], 3);

        let bad = call(&s, json!({"jsonrpc":"2.0","id":4,"method":"tools/call"})).await;
        assert_eq!(bad["error"]["code"], -32602);

        let unknown_tool = call(
            &s,
            json!({"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"nope"}}),
        )
        .await;
        assert_eq!(unknown_tool["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn info_and_requirements_tools() {
        let tmp = tempfile::tempdir().unwrap();
        let s = server(tmp.path()).await;

        let (is_error, text) = call_tool(&s, "get_skill_info", json!({"name":"image"})).await;
        assert!(!is_error);
        let info: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(info["category"], "Content Generation");
        assert_eq!(info["name"], "image");

        let (_, text) = call_tool(&s, "get_requirements", json!({"name":"image"})).await;
        let reqs: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(reqs["envVars"], json!(["OPENAI_API_KEY"]));
        assert_eq!(reqs["cliCommand"], "skill-image");
    }

    #[tokio::test]
    async fn invalid_and_missing_names_are_error_results() {
        let tmp = tempfile::tempdir().unwrap();
        let s = server(tmp.path()).await;

        let (is_error, text) = call_tool(&s, "get_skill_info", json!({"name":"BAD.NAME"})).await;
        assert!(is_error);
        assert!(text.starts_with("Invalid"));

        let (is_error, text) =
            call_tool(&s, "install_skill", json!({"name":"nonexistent-xyz-123"})).await;
        assert!(is_error);
        let result: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(result["success"], false);
        assert!(result["error"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn install_all_and_remove() {
        let tmp = tempfile::tempdir().unwrap();
        let s = server(tmp.path()).await;

        let (is_error, text) =
            call_tool(&s, "install_skill", json!({"name":"image","agent":"all"})).await;
        assert!(!is_error, "{text}");
        let results: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(results.as_array().unwrap().len(), 3);

        let (_, text) = call_tool(&s, "get_install_status", json!({"name":"image"})).await;
        let status: Value = serde_json::from_str(&text).unwrap();
        let installed = status["agents"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|a| a["installed"] == true)
            .count();
        assert_eq!(installed, 3);

        let (is_error, text) = call_tool(&s, "remove_skill", json!({"name":"image"})).await;
        assert!(!is_error);
        let removed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(removed["removed"], false);
    }

    #[tokio::test]
    async fn resources_catalog_and_skill() {
        let tmp = tempfile::tempdir().unwrap();
        let s = server(tmp.path()).await;

        let list = call(&s, json!({"jsonrpc":"2.0","id":1,"method":"resources/list"})).await;
        let uris: Vec<_> = list["result"]["resources"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["uri"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(uris, vec!["skills://catalog", "skills://skill/image"]);

        let read = call(
            &s,
            json!({"jsonrpc":"2.0","id":2,"method":"resources/read","params":{"uri":"skills://skill/image"}}),
        )
        .await;
        let text = read["result"]["contents"][0]["text"].as_str().unwrap();
        let record: Value = serde_json::from_str(text).unwrap();
        assert_eq!(record["displayName"], "Image");

        let missing = call(
            &s,
            json!({"jsonrpc":"2.0","id":3,"method":"resources/read","params":{"uri":"skills://skill/ghost"}}),
        )
        .await;
        assert_eq!(missing["error"]["code"], -32002);

        let templates = call(
            &s,
            json!({"jsonrpc":"2.0","id":4,"method":"resources/templates/list"}),
        )
        .await;
        assert_eq!(
            templates["result"]["resourceTemplates"][0]["uriTemplate"],
            "skills://skill/{name}"
        );
    }
}
