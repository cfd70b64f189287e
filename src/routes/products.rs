use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::products::{CatalogQuery, CatalogResponse},
    error::AppResult,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_catalog))
}

#[utoipa::path(
    get,
    path = "/products",
    params(
        ("offersOnly" = Option<bool>, Query, description = "Only return products flagged as offers"),
        ("category" = Option<String>, Query, description = "Restrict to a category slug"),
    ),
    responses(
        (status = 200, description = "Matching products plus the full category list", body = CatalogResponse),
    ),
    tag = "Catalog"
)]
pub async fn list_catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> AppResult<Json<CatalogResponse>> {
    let resp = catalog_service::list_catalog(&state, query).await?;
    Ok(Json(resp))
}
