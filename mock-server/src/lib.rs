use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

/// Items returned per list page.
pub const PAGE_SIZE: usize = 1000;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Inventory {
    pub id: i64,
    pub title: String,
    pub quantity: String,
    pub unit: String,
    pub category: String,
    pub state: String,
    pub place: String,
    pub etc: String,
    pub group_tag: String,
    pub code: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Writable fields of an inventory. Anything else in the body is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InventoryInput {
    pub title: String,
    pub quantity: String,
    pub unit: String,
    pub category: String,
    pub state: String,
    pub place: String,
    pub etc: String,
    pub group_tag: String,
    pub code: String,
}

/// List filters. `optional_attributes_*` are accepted but not applied since
/// this server stores no optional attributes.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub title: Option<String>,
    pub category: Option<String>,
    pub place: Option<String>,
    pub code: Option<String>,
    pub optional_attributes_name: Option<String>,
    pub optional_attributes_value: Option<String>,
    pub page: Option<usize>,
}

#[derive(Default)]
pub struct Store {
    next_id: i64,
    items: BTreeMap<i64, Inventory>,
}

#[derive(Clone)]
pub struct AppState {
    token: Arc<str>,
    store: Arc<RwLock<Store>>,
}

/// Error body in the API's `{code, status, message}` shape.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    message: &'static str,
}

impl ApiFailure {
    fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: "Inventory not found",
        }
    }

    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "Unauthorized",
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "code": self.status.as_u16(),
            "status": "error",
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

pub fn app(token: &str) -> Router {
    let state = AppState {
        token: Arc::from(token),
        store: Arc::new(RwLock::new(Store::default())),
    };
    Router::new()
        .route("/inventories", get(list_inventories).post(create_inventory))
        .route(
            "/inventories/{id}",
            get(get_inventory).put(update_inventory).delete(delete_inventory),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state)
}

pub async fn run(listener: TcpListener, token: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(token)).await
}

async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let expected = format!("Bearer {}", state.token);
    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == expected);
    if !authorized {
        tracing::debug!(uri = %request.uri(), "rejecting request without valid token");
        return ApiFailure::unauthorized().into_response();
    }
    next.run(request).await
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn item_matches(item: &Inventory, params: &ListParams) -> bool {
    let exact = |filter: &Option<String>, value: &str| filter.as_deref().is_none_or(|f| f == value);
    params.title.as_deref().is_none_or(|t| item.title.contains(t))
        && exact(&params.category, &item.category)
        && exact(&params.place, &item.place)
        && exact(&params.code, &item.code)
}

async fn list_inventories(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<Vec<Inventory>> {
    let store = state.store.read().await;
    let page = params.page.unwrap_or(1).max(1);
    let items = store
        .items
        .values()
        .filter(|item| item_matches(item, &params))
        .skip(page.saturating_sub(1).saturating_mul(PAGE_SIZE))
        .take(PAGE_SIZE)
        .cloned()
        .collect();
    Json(items)
}

async fn create_inventory(
    State(state): State<AppState>,
    Json(input): Json<InventoryInput>,
) -> (StatusCode, Json<Inventory>) {
    let mut store = state.store.write().await;
    store.next_id += 1;
    let timestamp = now();
    let item = Inventory {
        id: store.next_id,
        title: input.title,
        quantity: input.quantity,
        unit: input.unit,
        category: input.category,
        state: input.state,
        place: input.place,
        etc: input.etc,
        group_tag: input.group_tag,
        code: input.code,
        created_at: timestamp.clone(),
        updated_at: timestamp,
    };
    store.items.insert(item.id, item.clone());
    tracing::debug!(id = item.id, "created inventory");
    (StatusCode::CREATED, Json(item))
}

async fn get_inventory(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Inventory>, ApiFailure> {
    let store = state.store.read().await;
    store.items.get(&id).cloned().map(Json).ok_or_else(ApiFailure::not_found)
}

async fn update_inventory(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<InventoryInput>,
) -> Result<Json<Inventory>, ApiFailure> {
    let mut store = state.store.write().await;
    let item = store.items.get_mut(&id).ok_or_else(ApiFailure::not_found)?;
    item.title = input.title;
    item.quantity = input.quantity;
    item.unit = input.unit;
    item.category = input.category;
    item.state = input.state;
    item.place = input.place;
    item.etc = input.etc;
    item.group_tag = input.group_tag;
    item.code = input.code;
    item.updated_at = now();
    Ok(Json(item.clone()))
}

async fn delete_inventory(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiFailure> {
    let mut store = state.store.write().await;
    store
        .items
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(ApiFailure::not_found)
}
