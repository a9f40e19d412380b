// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Login and token verification.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// POST /api/auth/login
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> Response {
    let auth = match state.auth() {
        Ok(auth) => auth,
        Err(e) => return ApiError(e).into_response(),
    };

    let (Some(email), Some(password)) = (body.email, body.password) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "error": "Email e senha são obrigatórios"})),
        )
            .into_response();
    };

    if !auth.credentials_match(&email, &password) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "error": "Credenciais inválidas"})),
        )
            .into_response();
    }

    let token = match auth.sign_token() {
        Ok(token) => token,
        Err(e) => return ApiError(e).into_response(),
    };

    Json(json!({
        "success": true,
        "token": token,
        "user": {
            "id": 1,
            "email": auth.email(),
            "name": auth.display_name(),
        },
    }))
    .into_response()
}

/// GET /api/auth/verify
pub async fn verify(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let auth = match state.auth() {
        Ok(auth) => auth,
        Err(e) => return ApiError(e).into_response(),
    };

    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let Some(token) = token else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "error": "Token não fornecido"})),
        )
            .into_response();
    };

    match auth.verify_token(token) {
        Ok(claims) => Json(json!({"success": true, "user": claims})).into_response(),
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "error": "Token inválido"})),
        )
            .into_response(),
    }
}
