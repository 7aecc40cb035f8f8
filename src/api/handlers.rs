// API request handlers
// Author: Gabriel Demetrios Lafis

use actix_web::{web, HttpResponse, Responder};
use log::info;
use serde_json::json;

use crate::fetch::{ensure_upstream_host, fetch_api_data, ProxyRequest};
use crate::processing::{
    legend_entries, translate, BrushDomain, ChartConfiguration, ExplorerSession,
};
use crate::storage::SavedVisualization;
use crate::utils::validate_range_order;
use super::{models::*, AppState, ApiError};

/// List all known APIs
pub async fn list_apis(state: web::Data<AppState>) -> Result<impl Responder, ApiError> {
    let apis: Vec<_> = state.catalog.iter().collect();

    Ok(HttpResponse::Ok().json(json!({
        "apis": apis,
        "count": apis.len(),
    })))
}

/// Get one API descriptor
pub async fn get_api(state: web::Data<AppState>, path: web::Path<String>) -> Result<impl Responder, ApiError> {
    let id = path.into_inner();
    let api = state
        .catalog
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("API '{}' not found", id)))?;

    Ok(HttpResponse::Ok().json(api))
}

/// Fetch the rows of one API
pub async fn get_api_rows(state: web::Data<AppState>, path: web::Path<String>) -> Result<impl Responder, ApiError> {
    let id = path.into_inner();
    let api = state
        .catalog
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("API '{}' not found", id)))?;

    let rows = fetch_api_data(state.fetcher.as_ref(), api, None).await?;

    Ok(HttpResponse::Ok().json(json!({
        "id": id,
        "count": rows.len(),
        "rows": rows,
    })))
}

async fn proxy(state: &AppState, request: ProxyRequest) -> Result<HttpResponse, ApiError> {
    ensure_upstream_host(&request.url, &state.upstream)?;

    let request = request.into_row_request();
    let rows = state.fetcher.fetch_rows(&request).await?;

    Ok(HttpResponse::Ok().json(json!({
        "query_result": { "data": { "rows": rows } },
    })))
}

/// Forward a GET query to the upstream API
pub async fn proxy_get(state: web::Data<AppState>, query: web::Query<ProxyQuery>) -> Result<impl Responder, ApiError> {
    let request = ProxyRequest {
        url: query.into_inner().url,
        parameters: None,
    };

    proxy(&state, request).await
}

/// Forward a parameterized query to the upstream API
pub async fn proxy_post(state: web::Data<AppState>, payload: web::Json<ProxyRequest>) -> Result<impl Responder, ApiError> {
    proxy(&state, payload.into_inner()).await
}

/// Select, fetch and join the requested columns
async fn run_join(state: &AppState, request: &JoinRequest) -> Result<ExplorerSession, ApiError> {
    if request.selections.is_empty() {
        return Err(ApiError::ValidationError("'selections' cannot be empty".to_string()));
    }

    let mut session = ExplorerSession::new(state.catalog.clone());

    for selection in &request.selections {
        session.select(&selection.api_id, &selection.column_name)?;
    }
    for (api_id, column) in &request.date_column_mapping {
        session.set_date_mapping(api_id.clone(), column.clone());
    }

    session.refetch(state.fetcher.as_ref(), request.parameters.as_ref()).await;
    Ok(session)
}

/// Join selected columns from one or more APIs
pub async fn explorer_join(state: web::Data<AppState>, payload: web::Json<JoinRequest>) -> Result<impl Responder, ApiError> {
    let request = payload.into_inner();
    let session = run_join(&state, &request).await?;

    let response = JoinResponse {
        table: session.joined_table(),
        columns: session.columns().into_iter().map(ColumnStatus::from).collect(),
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Translate a builder configuration into a renderer chart config
pub async fn chart_config(payload: web::Json<ChartConfiguration>) -> Result<impl Responder, ApiError> {
    let config = translate(&payload.into_inner())?;
    Ok(HttpResponse::Ok().json(config))
}

/// List saved visualizations
pub async fn list_visualizations(state: web::Data<AppState>) -> Result<impl Responder, ApiError> {
    let visualizations = state.store.list()?;

    Ok(HttpResponse::Ok().json(json!({
        "visualizations": visualizations,
        "count": visualizations.len(),
    })))
}

/// Save a visualization with the data its join currently produces
pub async fn save_visualization(
    state: web::Data<AppState>,
    payload: web::Json<SaveVisualizationRequest>,
) -> Result<impl Responder, ApiError> {
    let request = payload.into_inner();
    request.configuration.validate()?;

    let session = run_join(&state, &request.join).await?;
    let table = session.joined_table();

    if table.needs_date_mapping {
        return Err(ApiError::ValidationError(
            "every API needs a date column or a date column mapping".to_string(),
        ));
    }

    let visualization = SavedVisualization::snapshot(request.configuration, &table)?;

    state.store.store(&visualization)?;
    info!("Saved visualization '{}' ({})", visualization.name, visualization.id);

    Ok(HttpResponse::Created().json(visualization))
}

/// Get a saved visualization
pub async fn get_visualization(state: web::Data<AppState>, path: web::Path<String>) -> Result<impl Responder, ApiError> {
    let visualization = state.store.load(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(visualization))
}

/// Delete a saved visualization
pub async fn delete_visualization(state: web::Data<AppState>, path: web::Path<String>) -> Result<impl Responder, ApiError> {
    state.store.delete(&path.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}

/// Load a dashboard dataset, brushed to the requested range
pub async fn get_dataset(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<DatasetQuery>,
) -> Result<impl Responder, ApiError> {
    let id = path.into_inner();
    let query = query.into_inner();

    let dataset = state
        .datasets
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Dataset '{}' not found", id)))?;

    let domain = BrushDomain::new(query.start.as_deref(), query.end.as_deref());
    validate_range_order(domain.start.as_deref(), domain.end.as_deref()).map_err(ApiError::ValidationError)?;

    let state_result = dataset.load(&query.filter_params()).await;
    let brushed = state_result.series().map(|series| series.filtered(&domain));
    let legend = brushed
        .as_ref()
        .map(|series| legend_entries(&series.to_rows(), &series.fields, &[]))
        .unwrap_or_default();

    Ok(HttpResponse::Ok().json(json!({
        "id": id,
        "title": dataset.definition().title,
        "fullDomain": state_result.series().map(|series| series.domain()),
        "result": state_result,
        "brushed": brushed,
        "legend": legend,
    })))
}
