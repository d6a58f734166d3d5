use crate::dtos::{ChildTypesResponse, CreateNodeRequest, DeleteNodeResponse, RenameNodeRequest};
use crate::models::Node;
use crate::services::hierarchy::{NodePath, NodeTree};
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

pub async fn list_nodes(State(state): State<AppState>) -> Result<Json<Vec<Node>>, AppError> {
    Ok(Json(state.manager.list_nodes().await?))
}

pub async fn node_tree(State(state): State<AppState>) -> Result<Json<Vec<NodeTree>>, AppError> {
    Ok(Json(state.manager.node_tree().await?))
}

pub async fn node_paths(State(state): State<AppState>) -> Result<Json<Vec<NodePath>>, AppError> {
    Ok(Json(state.manager.node_paths().await?))
}

#[tracing::instrument(skip(state, request), fields(name = %request.name, node_type = %request.node_type))]
pub async fn create_node(
    State(state): State<AppState>,
    Json(request): Json<CreateNodeRequest>,
) -> Result<(StatusCode, Json<Node>), AppError> {
    request.validate()?;

    let node = state
        .manager
        .create_node(&request.name, request.node_type, request.parent_id.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(node)))
}

pub async fn get_node(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
) -> Result<Json<Node>, AppError> {
    Ok(Json(state.manager.get_node(&node_id).await?))
}

#[tracing::instrument(skip(state, request))]
pub async fn rename_node(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
    Json(request): Json<RenameNodeRequest>,
) -> Result<Json<Node>, AppError> {
    request.validate()?;
    Ok(Json(state.manager.rename_node(&node_id, &request.name).await?))
}

#[tracing::instrument(skip(state))]
pub async fn delete_node(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
) -> Result<Json<DeleteNodeResponse>, AppError> {
    let configurations_removed = state.manager.delete_node(&node_id).await?;
    Ok(Json(DeleteNodeResponse {
        node_id,
        configurations_removed,
    }))
}

pub async fn ancestors(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
) -> Result<Json<Vec<Node>>, AppError> {
    Ok(Json(state.manager.ancestors(&node_id).await?))
}

pub async fn child_types(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
) -> Result<Json<ChildTypesResponse>, AppError> {
    let node = state.manager.get_node(&node_id).await?;
    Ok(Json(ChildTypesResponse {
        allowed_child_types: node.node_type.allowed_child_types(),
        node_type: node.node_type,
        node_id: node.id,
    }))
}
