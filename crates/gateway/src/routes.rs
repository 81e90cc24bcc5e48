use {
    axum::{
        Json,
        body::Bytes,
        extract::{Path, Query, State},
        response::{IntoResponse, Response},
    },
    serde::Deserialize,
    serde_json::json,
    skillbox_skills::SkillService,
    tracing::debug,
};

use crate::error::{ApiError, bad_request};

#[derive(Clone)]
pub struct AppState {
    pub service: SkillService,
    pub version: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DocsQuery {
    pub file: Option<String>,
}

/// Optional JSON body of install/remove.
#[derive(Debug, Default, Deserialize)]
pub struct TargetBody {
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub overwrite: bool,
}

fn parse_target_body(body: &Bytes) -> Result<TargetBody, Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(TargetBody::default());
    }
    serde_json::from_slice(body).map_err(|e| bad_request(format!("invalid JSON body: {e}")))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": state.version,
        "skills": state.service.registry().len(),
    }))
}

pub async fn list_skills(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let skills = state.service.list(query.category.as_deref())?;
    Ok(Json(skills).into_response())
}

pub async fn list_categories(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.service.categories())
}

pub async fn search_skills(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    Json(state.service.search(&query.q))
}

pub async fn skill_info(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    Ok(Json(state.service.info(&name).await?).into_response())
}

pub async fn skill_docs(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<DocsQuery>,
) -> Result<Response, ApiError> {
    let docs = state.service.docs(&name, query.file.as_deref()).await?;
    Ok(Json(docs).into_response())
}

pub async fn skill_requirements(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    Ok(Json(state.service.requirements(&name).await?).into_response())
}

pub async fn skill_status(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    Ok(Json(state.service.status(&name).await?).into_response())
}

pub async fn install_skill(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    let target = match parse_target_body(&body) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    debug!(skill = %name, agent = ?target.agent, scope = ?target.scope, "POST install");
    match state
        .service
        .install(
            &name,
            target.agent.as_deref(),
            target.scope.as_deref(),
            target.overwrite,
        )
        .await
    {
        Ok(report) => Json(report).into_response(),
        Err(e) => ApiError::for_skill(&name, e).into_response(),
    }
}

pub async fn remove_skill(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    let target = match parse_target_body(&body) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    debug!(skill = %name, agent = ?target.agent, scope = ?target.scope, "POST remove");
    match state
        .service
        .remove(&name, target.agent.as_deref(), target.scope.as_deref())
        .await
    {
        Ok(report) => Json(report).into_response(),
        Err(e) => ApiError::for_skill(&name, e).into_response(),
    }
}
