//! File and folder endpoints backed by the mapping store

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::Json;
use mb_core::mapping::EntryNode;
use mb_core::Core;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// 404 for a missing folder, 400 for a path that is not a folder.
async fn ensure_folder(path: &Path) -> ApiResult<()> {
	match tokio::fs::metadata(path).await {
		Ok(meta) if meta.is_dir() => Ok(()),
		Ok(_) => Err(ApiError::bad_request("The provided path is not a folder")),
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
			Err(ApiError::not_found("Folder not found"))
		}
		Err(e) => Err(ApiError::internal(e.to_string())),
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadFolderRequest {
	folder_path: Option<PathBuf>,
}

pub async fn read_folder(
	State(core): State<Arc<Core>>,
	Json(body): Json<ReadFolderRequest>,
) -> ApiResult<Json<Vec<EntryNode>>> {
	let folder_path = body
		.folder_path
		.ok_or_else(|| ApiError::bad_request("Folder path cannot be empty"))?;
	ensure_folder(&folder_path).await?;

	let structure = core.mapping.read_tree(&folder_path).await?;
	Ok(Json(structure))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContentParams {
	file_path: Option<PathBuf>,
}

pub async fn file_content(
	Query(params): Query<FileContentParams>,
) -> ApiResult<Json<Value>> {
	let file_path = params
		.file_path
		.ok_or_else(|| ApiError::bad_request("File path cannot be empty"))?;

	let content = match tokio::fs::read_to_string(&file_path).await {
		Ok(content) => content,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
			return Err(ApiError::not_found("File not found"))
		}
		Err(e) => return Err(ApiError::internal(e.to_string())),
	};
	Ok(Json(json!({ "content": content })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFileRequest {
	file_path: Option<PathBuf>,
	content: Option<String>,
}

pub async fn save_file(
	Json(body): Json<SaveFileRequest>,
) -> ApiResult<Json<Value>> {
	let file_path = body
		.file_path
		.ok_or_else(|| ApiError::bad_request("File path cannot be empty"))?;
	let content = body
		.content
		.ok_or_else(|| ApiError::bad_request("File content cannot be empty"))?;

	if !tokio::fs::try_exists(&file_path)
		.await
		.map_err(|e| ApiError::internal(e.to_string()))?
	{
		return Err(ApiError::not_found("File not found"));
	}

	tokio::fs::write(&file_path, content)
		.await
		.map_err(|e| ApiError::internal(e.to_string()))?;
	Ok(Json(json!({ "success": true, "message": "File saved" })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileRequest {
	folder_path: Option<PathBuf>,
	file_name: Option<String>,
}

pub async fn create_file(
	State(core): State<Arc<Core>>,
	Json(body): Json<CreateFileRequest>,
) -> ApiResult<Json<EntryNode>> {
	let (folder_path, file_name) = match (body.folder_path, body.file_name) {
		(Some(path), Some(name)) if !name.is_empty() => (path, name),
		_ => {
			return Err(ApiError::bad_request(
				"Folder path and file name cannot be empty",
			))
		}
	};

	let node = core.mapping.create_file(&folder_path, &file_name).await?;
	Ok(Json(node))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
	parent_path: Option<PathBuf>,
	folder_name: Option<String>,
	target_type: Option<String>,
}

pub async fn create_folder(
	State(core): State<Arc<Core>>,
	Json(body): Json<CreateFolderRequest>,
) -> ApiResult<Json<EntryNode>> {
	let (target_path, folder_name) = match (body.parent_path, body.folder_name) {
		(Some(path), Some(name)) if !name.is_empty() => (path, name),
		_ => {
			return Err(ApiError::bad_request(
				"Target path and folder name cannot be empty",
			))
		}
	};

	// A file target means "create next to it"
	let parent_path = if body.target_type.as_deref() == Some("file")
		&& tokio::fs::metadata(&target_path)
			.await
			.map(|meta| meta.is_file())
			.unwrap_or(false)
	{
		target_path
			.parent()
			.map(Path::to_path_buf)
			.unwrap_or(target_path)
	} else {
		target_path
	};

	let node = core.mapping.create_folder(&parent_path, &folder_name).await?;
	Ok(Json(node))
}

pub async fn upload_file(
	State(core): State<Arc<Core>>,
	mut multipart: Multipart,
) -> ApiResult<Json<EntryNode>> {
	let mut file: Option<(String, Vec<u8>)> = None;
	let mut folder_path: Option<PathBuf> = None;

	while let Some(field) = multipart
		.next_field()
		.await
		.map_err(|e| ApiError::bad_request(e.to_string()))?
	{
		match field.name() {
			Some("file") => {
				let name = field.file_name().unwrap_or_default().to_string();
				let bytes = field
					.bytes()
					.await
					.map_err(|e| ApiError::bad_request(e.to_string()))?;
				file = Some((name, bytes.to_vec()));
			}
			Some("folderPath") => {
				let text = field
					.text()
					.await
					.map_err(|e| ApiError::bad_request(e.to_string()))?;
				folder_path = Some(PathBuf::from(text));
			}
			_ => {}
		}
	}

	let (file_name, bytes) = file.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
	let folder_path =
		folder_path.ok_or_else(|| ApiError::bad_request("Folder path cannot be empty"))?;
	if file_name.is_empty() {
		return Err(ApiError::bad_request("No file selected"));
	}

	let node = core
		.mapping
		.upload_file(&folder_path, &file_name, &bytes)
		.await?;
	Ok(Json(node))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteItemRequest {
	file_path: Option<PathBuf>,
	#[serde(default)]
	is_folder: bool,
}

pub async fn delete_item(
	State(core): State<Arc<Core>>,
	Json(body): Json<DeleteItemRequest>,
) -> ApiResult<Json<Value>> {
	let file_path = body
		.file_path
		.ok_or_else(|| ApiError::bad_request("File path cannot be empty"))?;

	let name = core.mapping.delete(&file_path, body.is_folder).await?;
	let message = if body.is_folder {
		format!("Folder \"{name}\" deleted")
	} else {
		format!("File \"{name}\" deleted")
	};
	Ok(Json(json!({ "success": true, "message": message })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameItemRequest {
	file_path: Option<PathBuf>,
	new_name: Option<String>,
	#[serde(default)]
	is_folder: bool,
}

pub async fn rename_item(
	State(core): State<Arc<Core>>,
	Json(body): Json<RenameItemRequest>,
) -> ApiResult<Json<Value>> {
	let file_path = body
		.file_path
		.ok_or_else(|| ApiError::bad_request("File path cannot be empty"))?;
	let new_name = body
		.new_name
		.filter(|name| !name.is_empty())
		.ok_or_else(|| ApiError::bad_request("New name cannot be empty"))?;

	let renamed = core
		.mapping
		.rename(&file_path, &new_name, body.is_folder)
		.await?;
	Ok(Json(json!({
		"success": true,
		"message": format!("Renamed to \"{renamed}\""),
	})))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderItemsRequest {
	parent_folder_path: Option<PathBuf>,
	dragged_id: Option<Uuid>,
	target_id: Option<Uuid>,
	target_index: Option<i32>,
}

pub async fn reorder_items(
	State(core): State<Arc<Core>>,
	Json(body): Json<ReorderItemsRequest>,
) -> ApiResult<Json<Value>> {
	let (parent, dragged_id, target_id, target_index) = match (
		body.parent_folder_path,
		body.dragged_id,
		body.target_id,
		body.target_index,
	) {
		(Some(parent), Some(dragged), Some(target), Some(index)) => {
			(parent, dragged, target, index)
		}
		_ => return Err(ApiError::bad_request("Missing required parameters")),
	};

	core.mapping
		.reorder(&parent, dragged_id, target_id, target_index)
		.await?;
	Ok(Json(json!({ "success": true })))
}
