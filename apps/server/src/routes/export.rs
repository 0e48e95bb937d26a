//! Export endpoints driving the external book builder

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use mb_core::Core;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
	session_id: Option<String>,
}

impl ExportRequest {
	fn session_id(self) -> ApiResult<String> {
		self.session_id
			.filter(|id| !id.is_empty())
			.ok_or_else(|| ApiError::bad_request("Session ID cannot be empty"))
	}
}

pub async fn export_book(
	State(core): State<Arc<Core>>,
	Json(body): Json<ExportRequest>,
) -> ApiResult<Json<Value>> {
	let session_id = body.session_id()?;
	let export = core.sessions.export_book(&session_id).await?;

	Ok(Json(json!({
		"success": true,
		"message": "Export complete",
		"output": export.output,
		"book_path": export.book_path,
	})))
}

pub async fn export_pdf(
	State(core): State<Arc<Core>>,
	Json(body): Json<ExportRequest>,
) -> ApiResult<impl IntoResponse> {
	let session_id = body.session_id()?;
	let export = core.sessions.export_pdf(&session_id).await?;

	let bytes = tokio::fs::read(&export.path)
		.await
		.map_err(|e| ApiError::internal(e.to_string()))?;

	Ok((
		[
			(header::CONTENT_TYPE, "application/pdf".to_string()),
			(
				header::CONTENT_DISPOSITION,
				format!("attachment; filename=\"{}\"", export.file_name),
			),
		],
		bytes,
	))
}

pub async fn export_summary(
	State(core): State<Arc<Core>>,
	Json(body): Json<ExportRequest>,
) -> ApiResult<Json<Value>> {
	let session_id = body.session_id()?;
	let summary_path = core.sessions.export_summary(&session_id).await?;

	Ok(Json(json!({
		"success": true,
		"message": "Summary exported to SUMMARY.md",
		"summaryPath": summary_path,
	})))
}
