use {
    axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    serde_json::json,
    skillbox_skills::{Error, ErrorKind},
};

/// A core error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    error: Error,
    /// Set for install/remove so the body matches their result shape.
    skill: Option<String>,
}

impl ApiError {
    pub fn for_skill(skill: &str, error: Error) -> Self {
        Self {
            error,
            skill: Some(skill.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.error.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Operational => StatusCode::OK,
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self { error, skill: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.error.to_string();
        let body = match (&self.skill, self.error.kind()) {
            (Some(skill), _) => json!({ "skill": skill, "success": false, "error": message }),
            (None, ErrorKind::Operational) => json!({ "success": false, "error": message }),
            (None, _) => json!({ "error": message }),
        };
        (status, Json(body)).into_response()
    }
}

/// A request body that could not be parsed.
pub fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message.into() })),
    )
        .into_response()
}
