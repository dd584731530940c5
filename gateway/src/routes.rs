// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::{Extension, Path, Request, State};
use axum::http::{StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use cesgate_core::{Context, Signer};
use cesgate_huaweicloud_apig::Credential;
use futures::FutureExt;
use serde::Serialize;

use crate::dashboard::{Dashboard, DashboardStore, MemoryDashboardStore};
use crate::forward::ProxyForwarder;
use crate::identity::{IamIdentityProvider, IdentityProvider, X_AUTH_TOKEN};
use crate::{Config, GatewayError};

const HEALTH_CHECK: &str = "/health-check";

/// Shared state of all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Resolves caller tokens.
    pub identity: Arc<dyn IdentityProvider>,
    /// Relays monitoring API calls.
    pub forwarder: Arc<ProxyForwarder>,
    /// Dashboard persistence.
    pub dashboards: Arc<dyn DashboardStore>,
    /// Budget for producing a response head.
    pub read_timeout: Duration,
}

impl AppState {
    /// Wire the IAM identity check, the monitoring API forwarder and an
    /// in-memory dashboard store from `config`.
    ///
    /// `ctx` is used for the identity calls, `client` for the forwarded ones.
    pub fn new(
        ctx: Context,
        config: &Config,
        signer: Signer<Credential>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            identity: Arc::new(IamIdentityProvider::new(ctx, &config.iam_endpoint)),
            forwarder: Arc::new(ProxyForwarder::new(
                &config.ces_endpoint,
                &config.stage,
                signer,
                client,
            )),
            dashboards: Arc::new(MemoryDashboardStore::new()),
            read_timeout: config.read_timeout,
        }
    }
}

/// Id of the authenticated caller, set by the identity middleware.
#[derive(Debug, Clone)]
pub struct UserId(pub String);

/// Build the gateway router.
///
/// Every path except `/health-check` requires a token, unknown ones included.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(HEALTH_CHECK, get(|| async { StatusCode::OK }))
        .route("/ces", get(ces))
        .route("/ces/", get(ces))
        .route("/ces/{*path}", get(ces))
        .route(
            "/dashboards",
            get(list_dashboards)
                .post(add_dashboard)
                .put(update_dashboard),
        )
        .route("/dashboards/{id}", get(get_dashboard).delete(delete_dashboard))
        .fallback(|| async { StatusCode::NOT_FOUND })
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(middleware::from_fn_with_state(state.clone(), read_timeout))
        .layer(middleware::from_fn(recover))
        .layer(middleware::from_fn(access_log))
        .with_state(state)
}

async fn access_log(req: Request, next: Next) -> Response {
    if req.uri().path() == HEALTH_CHECK {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let resp = next.run(req).await;
    log::info!(
        "{method} {path} {} {:?}",
        resp.status().as_u16(),
        start.elapsed()
    );
    resp
}

async fn recover(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(resp) => resp,
        Err(_) => {
            log::error!("panic while handling {method} {path}");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
        }
    }
}

async fn read_timeout(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match tokio::time::timeout(state.read_timeout, next.run(req)).await {
        Ok(resp) => resp,
        Err(_) => GatewayError::Timeout.into_response(),
    }
}

async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    if req.uri().path() == HEALTH_CHECK {
        return Ok(next.run(req).await);
    }

    let token = req
        .headers()
        .get(X_AUTH_TOKEN)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(GatewayError::TokenAbsent)?
        .to_string();

    let user = state.identity.check(&token).await?;
    req.extensions_mut().insert(UserId(user));
    Ok(next.run(req).await)
}

async fn ces(State(state): State<AppState>, uri: Uri) -> Result<Response, GatewayError> {
    state.forwarder.forward(ces_suffix(uri.path()), uri.query()).await
}

/// Raw path below `/ces`, without its leading `/`.
fn ces_suffix(path: &str) -> &str {
    let rest = path.strip_prefix("/ces").unwrap_or(path);
    rest.strip_prefix('/').unwrap_or(rest)
}

#[derive(Serialize)]
struct DashboardsRes {
    dashboard: Vec<Dashboard>,
}

#[derive(Serialize)]
struct DashboardRes {
    dashboard: Dashboard,
}

#[derive(Serialize)]
struct AddDashboardRes {
    id: i64,
}

fn parse_id(id: &str) -> Result<i64, GatewayError> {
    id.parse().map_err(|_| GatewayError::InvalidDashboardId)
}

fn parse_dashboard(body: &[u8]) -> Result<Dashboard, GatewayError> {
    serde_json::from_slice(body).map_err(GatewayError::InvalidDashboard)
}

async fn list_dashboards(
    State(state): State<AppState>,
    Extension(UserId(user)): Extension<UserId>,
) -> Result<Json<DashboardsRes>, GatewayError> {
    let dashboard = state.dashboards.list(&user).await?;
    Ok(Json(DashboardsRes { dashboard }))
}

async fn get_dashboard(
    State(state): State<AppState>,
    Extension(UserId(user)): Extension<UserId>,
    Path(id): Path<String>,
) -> Result<Json<DashboardRes>, GatewayError> {
    let id = parse_id(&id)?;
    let dashboard = state
        .dashboards
        .get(&user, id)
        .await?
        .ok_or(GatewayError::DashboardNotFound)?;
    Ok(Json(DashboardRes { dashboard }))
}

async fn add_dashboard(
    State(state): State<AppState>,
    Extension(UserId(user)): Extension<UserId>,
    body: Bytes,
) -> Result<Json<AddDashboardRes>, GatewayError> {
    let d = parse_dashboard(&body)?;
    let id = state.dashboards.insert(&user, &d.name, d.graphs).await?;
    Ok(Json(AddDashboardRes { id }))
}

async fn update_dashboard(
    State(state): State<AppState>,
    Extension(UserId(user)): Extension<UserId>,
    body: Bytes,
) -> Result<StatusCode, GatewayError> {
    let d = parse_dashboard(&body)?;
    state.dashboards.update(&user, d).await?;
    Ok(StatusCode::OK)
}

async fn delete_dashboard(
    State(state): State<AppState>,
    Extension(UserId(user)): Extension<UserId>,
    Path(id): Path<String>,
) -> Result<StatusCode, GatewayError> {
    let id = parse_id(&id)?;
    state.dashboards.delete(&user, id).await?;
    Ok(StatusCode::OK)
}
