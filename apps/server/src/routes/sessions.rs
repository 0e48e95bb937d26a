//! Session endpoints

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use mb_core::Core;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
	folder_name: Option<String>,
}

pub async fn create_website_session(
	State(core): State<Arc<Core>>,
	Json(body): Json<CreateSessionRequest>,
) -> ApiResult<Json<Value>> {
	let folder_name = body
		.folder_name
		.filter(|name| !name.trim().is_empty())
		.ok_or_else(|| ApiError::bad_request("Folder name cannot be empty"))?;

	let session_id = core.sessions.create(&folder_name).await?;
	Ok(Json(json!({ "sessionId": session_id })))
}

#[derive(Deserialize)]
pub struct GetSessionParams {
	id: Option<String>,
}

pub async fn get_folder_session(
	State(core): State<Arc<Core>>,
	Query(params): Query<GetSessionParams>,
) -> ApiResult<Json<mb_core::session::SessionView>> {
	let id = params
		.id
		.filter(|id| !id.is_empty())
		.ok_or_else(|| ApiError::bad_request("Session ID cannot be empty"))?;

	let view = core.sessions.get(&id).await?;
	Ok(Json(view))
}

pub async fn get_all_sessions(State(core): State<Arc<Core>>) -> ApiResult<Json<Value>> {
	let sessions = core.sessions.list().await?;
	Ok(Json(json!({ "sessions": sessions })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSessionRequest {
	session_id: Option<String>,
	new_name: Option<String>,
}

pub async fn edit_session(
	State(core): State<Arc<Core>>,
	Json(body): Json<EditSessionRequest>,
) -> ApiResult<Json<Value>> {
	let (session_id, new_name) = match (body.session_id, body.new_name) {
		(Some(id), Some(name)) if !id.is_empty() && !name.is_empty() => (id, name),
		_ => {
			return Err(ApiError::bad_request(
				"Session ID and new name cannot be empty",
			))
		}
	};

	let new_folder_path = core.sessions.rename(&session_id, &new_name).await?;
	Ok(Json(json!({
		"success": true,
		"message": "Session updated",
		"newFolderPath": new_folder_path,
	})))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSessionRequest {
	session_id: Option<String>,
}

pub async fn delete_session(
	State(core): State<Arc<Core>>,
	Json(body): Json<DeleteSessionRequest>,
) -> ApiResult<Json<Value>> {
	let session_id = body
		.session_id
		.filter(|id| !id.is_empty())
		.ok_or_else(|| ApiError::bad_request("Session ID cannot be empty"))?;

	core.sessions.delete(&session_id).await?;
	Ok(Json(json!({ "success": true, "message": "Session deleted" })))
}
