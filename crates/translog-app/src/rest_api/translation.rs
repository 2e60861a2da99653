use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use axum_valid::Garde;
use garde::Validate;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;
use translog_dal::record::{CreateTranslationRecord, TranslationRecordRepository};

use crate::error::ApiResult;
use crate::rest_api::{Page, Paging};
use crate::state::AppState;

crate::repository_from_request!(TranslationRecordRepository);

pub async fn create_translation(
    repository: TranslationRecordRepository,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    Garde(Json(mut payload)): Garde<Json<CreateTranslationRecord>>,
) -> ApiResult<impl IntoResponse> {
    // the observed peer address wins over whatever the client sent
    payload.ip_address = Some(remote.ip().to_string());
    let record = repository.create(payload).await?;

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get_translation(
    Path(id): Path<i64>,
    repository: TranslationRecordRepository,
) -> ApiResult<impl IntoResponse> {
    let record = repository
        .find(id)
        .await?
        .ok_or(crate::error::ApiError::NotFound)?;

    Ok((StatusCode::OK, Json(record)))
}

pub async fn list_user_translations(
    Path(user_id): Path<String>,
    repository: TranslationRecordRepository,
) -> ApiResult<impl IntoResponse> {
    let records = repository.list_by_user(&user_id).await?;

    Ok((StatusCode::OK, Json(records)))
}

pub async fn page_user_translations(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    repository: TranslationRecordRepository,
    Garde(Query(paging)): Garde<Query<Paging>>,
) -> ApiResult<impl IntoResponse> {
    let default_page_size = state.config().default_page_size;
    let page_size = paging.page_size(default_page_size);
    let listing_params = paging.into_listing_params(default_page_size)?;
    let batch = repository.list_by_user_paged(&user_id, listing_params).await?;

    Ok((StatusCode::OK, Json(Page::from_batch(batch, page_size))))
}

#[derive(Debug, Clone, Validate, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    #[garde(length(max = 255))]
    text: Option<String>,
    #[garde(length(max = 50))]
    user_id: Option<String>,
}

pub async fn search_translations(
    State(state): State<AppState>,
    repository: TranslationRecordRepository,
    Garde(Query(filter)): Garde<Query<SearchFilter>>,
    Garde(Query(paging)): Garde<Query<Paging>>,
) -> ApiResult<impl IntoResponse> {
    debug!("Search filter: {:?}", filter);
    let default_page_size = state.config().default_page_size;
    let page_size = paging.page_size(default_page_size);
    let listing_params = paging.into_listing_params(default_page_size)?;
    let batch = repository
        .search(filter.text.as_deref(), filter.user_id.as_deref(), listing_params)
        .await?;

    Ok((StatusCode::OK, Json(Page::from_batch(batch, page_size))))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    deleted: bool,
}

pub async fn delete_translation(
    Path(id): Path<i64>,
    repository: TranslationRecordRepository,
) -> ApiResult<impl IntoResponse> {
    repository.delete(id).await?;

    Ok((StatusCode::OK, Json(DeleteResponse { deleted: true })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationStats {
    pub total_translations: u64,
    pub today_translations: u64,
}

pub async fn translation_stats(
    repository: TranslationRecordRepository,
) -> ApiResult<impl IntoResponse> {
    let total_translations = repository.count().await?;
    let today_translations = repository
        .count_created_between(translog_dal::today_midnight(), translog_dal::now())
        .await?;

    Ok((
        StatusCode::OK,
        Json(TranslationStats {
            total_translations,
            today_translations,
        }),
    ))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(create_translation))
        .route("/stats", get(translation_stats))
        .route("/search", get(search_translations))
        .route("/user/{user_id}", get(list_user_translations))
        .route("/user/{user_id}/page", get(page_user_translations))
        .route(
            "/{id}",
            get(get_translation).delete(delete_translation),
        )
}
