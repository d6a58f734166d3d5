use crate::dtos::{
    CloneConfigurationRequest, ConfigurationRequest, CopyConfigurationsRequest,
    CopyConfigurationsResponse, DeleteConfigurationsRequest, DeleteConfigurationsResponse,
    DuplicateConfigurationsRequest, MoveConfigurationsRequest, MoveConfigurationsResponse,
};
use crate::middleware::Operator;
use crate::models::Configuration;
use crate::services::manager::{ClosurePreview, ReferenceReport};
use crate::services::resolver::VisibleConfiguration;
use crate::services::CloneReport;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

/// Configurations visible from a node, own and inherited.
pub async fn visible_configurations(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
) -> Result<Json<Vec<VisibleConfiguration>>, AppError> {
    Ok(Json(state.manager.visible_configurations(&node_id).await?))
}

#[tracing::instrument(skip(state, request), fields(operator = %operator.0))]
pub async fn create_configuration(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
    operator: Operator,
    Json(request): Json<ConfigurationRequest>,
) -> Result<(StatusCode, Json<Configuration>), AppError> {
    request.validate()?;
    let config = state
        .manager
        .create_configuration(&node_id, request.into(), &operator.0)
        .await?;
    Ok((StatusCode::CREATED, Json(config)))
}

#[tracing::instrument(skip(state, request), fields(operator = %operator.0))]
pub async fn update_configuration(
    State(state): State<AppState>,
    Path((node_id, configuration_id)): Path<(String, String)>,
    operator: Operator,
    Json(request): Json<ConfigurationRequest>,
) -> Result<Json<Configuration>, AppError> {
    request.validate()?;
    let config = state
        .manager
        .update_configuration(&node_id, &configuration_id, request.into(), &operator.0)
        .await?;
    Ok(Json(config))
}

#[tracing::instrument(skip(state, request), fields(operator = %operator.0))]
pub async fn move_configurations(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
    operator: Operator,
    Json(request): Json<MoveConfigurationsRequest>,
) -> Result<Json<MoveConfigurationsResponse>, AppError> {
    request.validate()?;
    let moved = state
        .manager
        .move_configurations(
            &node_id,
            &request.configuration_ids,
            &request.destination_node_id,
            &operator.0,
        )
        .await?;
    Ok(Json(MoveConfigurationsResponse {
        destination_node_id: request.destination_node_id,
        moved,
    }))
}

#[tracing::instrument(skip(state, request))]
pub async fn copy_configurations(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
    Json(request): Json<CopyConfigurationsRequest>,
) -> Result<(StatusCode, Json<CopyConfigurationsResponse>), AppError> {
    request.validate()?;
    let policy = request
        .policy
        .unwrap_or_else(|| state.manager.closure_policy());
    let copies = state
        .manager
        .copy_configurations(
            &node_id,
            &request.configuration_ids,
            &request.destination_node_id,
            Some(policy),
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CopyConfigurationsResponse {
            destination_node_id: request.destination_node_id,
            policy,
            copies,
        }),
    ))
}

#[tracing::instrument(skip(state, request))]
pub async fn duplicate_configurations(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
    Json(request): Json<DuplicateConfigurationsRequest>,
) -> Result<(StatusCode, Json<CopyConfigurationsResponse>), AppError> {
    request.validate()?;
    let policy = request
        .policy
        .unwrap_or_else(|| state.manager.closure_policy());
    let copies = state
        .manager
        .duplicate_configurations(&node_id, &request.configuration_ids, Some(policy))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CopyConfigurationsResponse {
            destination_node_id: node_id,
            policy,
            copies,
        }),
    ))
}

#[tracing::instrument(skip(state, request))]
pub async fn delete_configurations(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
    Json(request): Json<DeleteConfigurationsRequest>,
) -> Result<Json<DeleteConfigurationsResponse>, AppError> {
    request.validate()?;
    let deleted = state
        .manager
        .delete_configurations(&node_id, &request.configuration_ids)
        .await?;
    Ok(Json(DeleteConfigurationsResponse { node_id, deleted }))
}

pub async fn list_configurations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Configuration>>, AppError> {
    Ok(Json(state.manager.list_configurations().await?))
}

pub async fn get_configuration(
    State(state): State<AppState>,
    Path(configuration_id): Path<String>,
) -> Result<Json<Configuration>, AppError> {
    Ok(Json(state.manager.get_configuration(&configuration_id).await?))
}

pub async fn configuration_references(
    State(state): State<AppState>,
    Path(configuration_id): Path<String>,
) -> Result<Json<ReferenceReport>, AppError> {
    Ok(Json(state.manager.references(&configuration_id).await?))
}

pub async fn configuration_closure(
    State(state): State<AppState>,
    Path(configuration_id): Path<String>,
) -> Result<Json<ClosurePreview>, AppError> {
    Ok(Json(state.manager.closure(&configuration_id).await?))
}

#[tracing::instrument(skip(state, request), fields(destination = %request.destination_node_id))]
pub async fn clone_configuration(
    State(state): State<AppState>,
    Path(configuration_id): Path<String>,
    Json(request): Json<CloneConfigurationRequest>,
) -> Result<(StatusCode, Json<CloneReport>), AppError> {
    let report = state
        .manager
        .clone_configuration(&configuration_id, &request.destination_node_id)
        .await?;
    Ok((StatusCode::CREATED, Json(report)))
}
