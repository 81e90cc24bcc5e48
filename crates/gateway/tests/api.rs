#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{path::Path, sync::Arc};

use {
    axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
    },
    serde_json::Value,
    skillbox_gateway::build_app,
    skillbox_skills::{
        Registry, SkillService, agents::AgentPaths, install::Installer, state::InstallLayout,
    },
    tempfile::TempDir,
    tower::ServiceExt,
};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

async fn app() -> (TempDir, Router) {
    let tmp = tempfile::tempdir().unwrap();
    let catalog = tmp.path().join("skills");
    write(
        &catalog,
        "image/SKILL.md",
        "---\nname: image\ndescription: Generate images from prompts\ncategory: Content Generation\n---\n# Image\n",
    );
    write(&catalog, "image/README.md", "# Image\n\nUsage notes.\n");
    write(
        &catalog,
        "notes/SKILL.md",
        "---\nname: notes\ndescription: Take quick notes\ncategory: Productivity\n---\n",
    );

    let registry = Registry::load(&catalog).await.unwrap();
    let layout = InstallLayout::new(
        tmp.path().join("installed"),
        AgentPaths {
            home: Some(tmp.path().join("home")),
            project: tmp.path().join("proj"),
        },
    );
    let service = SkillService::new(Arc::new(registry), Installer::new(layout));
    (tmp, build_app(service))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let request = builder
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_reports_catalog_size() {
    let (_tmp, app) = app().await;
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["skills"], 2);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn lists_and_filters_skills() {
    let (_tmp, app) = app().await;
    let (status, body) = send(&app, Method::GET, "/api/skills", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(&app, Method::GET, "/api/skills?category=productivity", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "notes");

    let (status, body) = send(&app, Method::GET, "/api/skills?category=Bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Bogus"));
}

#[tokio::test]
async fn categories_and_search() {
    let (_tmp, app) = app().await;
    let (_, body) = send(&app, Method::GET, "/api/categories", None).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Content Generation", "Productivity"]);

    let (status, body) = send(&app, Method::GET, "/api/skills/search?q=IMAGES", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "image");

    let (_, body) = send(&app, Method::GET, "/api/skills/search", None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_name_is_bad_request() {
    let (_tmp, app) = app().await;
    let (status, body) = send(&app, Method::GET, "/api/skills/BAD.NAME", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid skill name"));
}

#[tokio::test]
async fn unknown_skill_is_not_found() {
    let (_tmp, app) = app().await;
    let (status, _) = send(&app, Method::GET, "/api/skills/nonexistent-xyz-123", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/skills/nonexistent-xyz-123/install",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["skill"], "nonexistent-xyz-123");
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn info_docs_and_requirements() {
    let (_tmp, app) = app().await;
    let (status, body) = send(&app, Method::GET, "/api/skills/image", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "Content Generation");
    assert_eq!(body["installed"], false);
    assert_eq!(body["docs"], serde_json::json!(["SKILL.md", "README.md"]));

    let (status, body) = send(&app, Method::GET, "/api/skills/image/docs?file=README.md", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["content"].as_str().unwrap().contains("Usage notes"));

    let (status, _) = send(&app, Method::GET, "/api/skills/image/docs?file=../x.md", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::GET, "/api/skills/image/requirements", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["envVars"].is_array());
}

#[tokio::test]
async fn install_for_all_agents_returns_array_then_status() {
    let (_tmp, app) = app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/skills/image/install",
        Some(r#"{"agent":"all","scope":"project"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r["success"] == true));

    let (_, body) = send(&app, Method::GET, "/api/skills/image/status", None).await;
    let project: Vec<&Value> = body["agents"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|a| a["scope"] == "project")
        .collect();
    assert!(project.iter().all(|a| a["installed"] == true));
}

#[tokio::test]
async fn install_single_agent_returns_object() {
    let (_tmp, app) = app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/skills/notes/install",
        Some(r#"{"agent":"cursor"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["agent"], "cursor");
    assert!(body["path"].as_str().unwrap().ends_with("notes.mdc"));
}

#[tokio::test]
async fn install_rejects_bad_body_and_agent() {
    let (_tmp, app) = app().await;
    let (status, _) = send(&app, Method::POST, "/api/skills/image/install", Some("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/skills/image/install",
        Some(r#"{"agent":"vim"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("vim"));
}

#[tokio::test]
async fn remove_twice_reports_nothing_removed() {
    let (_tmp, app) = app().await;
    let (status, body) = send(&app, Method::POST, "/api/skills/image/install", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, body) = send(&app, Method::POST, "/api/skills/image/remove", None).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["removed"], true);

    let (status, body) = send(&app, Method::POST, "/api/skills/image/remove", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], false);
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let (_tmp, app) = app().await;
    let request = Request::builder()
        .uri("/api/skills")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
}

#[tokio::test]
async fn preflight_is_answered_without_routing() {
    let (_tmp, app) = app().await;
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/skills/image/install")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(
        headers[header::ACCESS_CONTROL_ALLOW_METHODS]
            .to_str()
            .unwrap()
            .contains("POST")
    );
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
}
