//! `skills://` resources: the whole catalog and one record per skill.

use skillbox_skills::{ErrorKind, SkillService};

use crate::types::{
    INTERNAL_ERROR, JsonRpcError, McpResource, McpResourceTemplate, RESOURCE_NOT_FOUND,
    ResourceContents, ResourceReadResult,
};

pub const CATALOG_URI: &str = "skills://catalog";
const SKILL_URI_PREFIX: &str = "skills://skill/";
const JSON_MIME: &str = "application/json";

pub fn skill_uri(name: &str) -> String {
    format!("{SKILL_URI_PREFIX}{name}")
}

pub fn list_resources(service: &SkillService) -> Vec<McpResource> {
    let catalog = McpResource {
        uri: CATALOG_URI.into(),
        name: "Skill catalog".into(),
        description: Some(format!("All {} skills", service.registry().len())),
        mime_type: Some(JSON_MIME.into()),
    };
    std::iter::once(catalog)
        .chain(service.registry().skills().iter().map(|s| McpResource {
            uri: skill_uri(&s.name),
            name: s.display_name.clone(),
            description: Some(s.description.clone()).filter(|d| !d.is_empty()),
            mime_type: Some(JSON_MIME.into()),
        }))
        .collect()
}

pub fn resource_templates() -> Vec<McpResourceTemplate> {
    vec![McpResourceTemplate {
        uri_template: format!("{SKILL_URI_PREFIX}{{name}}"),
        name: "Skill record".into(),
        description: Some("Catalog record, doc list and install state for one skill".into()),
        mime_type: Some(JSON_MIME.into()),
    }]
}

pub async fn read_resource(
    service: &SkillService,
    uri: &str,
) -> Result<ResourceReadResult, JsonRpcError> {
    let value = if uri == CATALOG_URI {
        serde_json::to_value(service.registry().skills())
    } else if let Some(name) = uri.strip_prefix(SKILL_URI_PREFIX) {
        let detail = service.info(name).await.map_err(|e| match e.kind() {
            ErrorKind::Validation => JsonRpcError::invalid_params(e.to_string()),
            ErrorKind::NotFound => JsonRpcError::new(RESOURCE_NOT_FOUND, e.to_string()),
            ErrorKind::Operational => JsonRpcError::new(INTERNAL_ERROR, e.to_string()),
        })?;
        serde_json::to_value(detail)
    } else {
        return Err(JsonRpcError::new(
            RESOURCE_NOT_FOUND,
            format!("Unknown resource: {uri}"),
        ));
    }
    .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))?;

    Ok(ResourceReadResult {
        contents: vec![ResourceContents {
            uri: uri.to_string(),
            mime_type: Some(JSON_MIME.into()),
            text: value.to_string(),
        }],
    })
}
