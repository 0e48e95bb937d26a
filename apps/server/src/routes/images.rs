//! Image upload/proxy endpoints
//!
//! These keep the editor's expected response envelope: `code` 0 on
//! success, 1 on failure, with per-file results in `succMap`/`errFiles`.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use mb_core::Core;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::error::ApiResult;

#[derive(Serialize, Default)]
struct UploadData {
	#[serde(rename = "errFiles")]
	err_files: Vec<String>,
	#[serde(rename = "succMap")]
	succ_map: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct UploadResponse {
	msg: String,
	code: i32,
	data: UploadData,
}

fn image_url(core: &Core, filename: &str) -> String {
	format!("{}/api/get-image/{}", core.config.base_url(), filename)
}

pub async fn upload_image(
	State(core): State<Arc<Core>>,
	mut multipart: Multipart,
) -> impl IntoResponse {
	let mut data = UploadData::default();
	let mut saw_file = false;

	loop {
		let field = match multipart.next_field().await {
			Ok(Some(field)) => field,
			Ok(None) => break,
			Err(e) => {
				warn!("Rejected image upload: {}", e);
				return (
					StatusCode::BAD_REQUEST,
					Json(UploadResponse {
						msg: e.to_string(),
						code: 1,
						data: UploadData::default(),
					}),
				);
			}
		};

		if field.name() != Some("file[]") {
			continue;
		}
		saw_file = true;

		let original = field.file_name().unwrap_or_default().to_string();
		let bytes = match field.bytes().await {
			Ok(bytes) => bytes,
			Err(_) => {
				data.err_files.push(original);
				continue;
			}
		};

		match core.images.save(&original, &bytes).await {
			Ok(filename) => {
				data.succ_map.insert(original, image_url(&core, &filename));
			}
			Err(e) => {
				warn!("Image upload failed for {}: {}", original, e);
				data.err_files.push(original);
			}
		}
	}

	if !saw_file {
		return (
			StatusCode::BAD_REQUEST,
			Json(UploadResponse {
				msg: "No file uploaded".to_string(),
				code: 1,
				data: UploadData::default(),
			}),
		);
	}

	(
		StatusCode::OK,
		Json(UploadResponse {
			msg: String::new(),
			code: 0,
			data,
		}),
	)
}

#[derive(Deserialize)]
pub struct UploadFromUrlRequest {
	url: Option<String>,
}

pub async fn upload_image_from_url(
	State(core): State<Arc<Core>>,
	Json(body): Json<UploadFromUrlRequest>,
) -> impl IntoResponse {
	let Some(url) = body.url.filter(|url| !url.is_empty()) else {
		return (
			StatusCode::BAD_REQUEST,
			Json(json!({ "msg": "Image URL cannot be empty", "code": 1, "data": {} })),
		);
	};

	match core.images.fetch_from_url(&url).await {
		Ok(filename) => (
			StatusCode::OK,
			Json(json!({
				"msg": "",
				"code": 0,
				"data": {
					"originalURL": url,
					"url": image_url(&core, &filename),
				},
			})),
		),
		Err(e) => {
			warn!("Image fetch from {} failed: {}", url, e);
			(
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(json!({ "msg": e.to_string(), "code": 1, "data": {} })),
			)
		}
	}
}

pub async fn get_image(
	State(core): State<Arc<Core>>,
	Path(filename): Path<String>,
) -> ApiResult<impl IntoResponse> {
	let (path, bytes) = core.images.open(&filename).await?;
	let mime = mime_guess::from_path(&path).first_or_octet_stream();
	Ok(([(header::CONTENT_TYPE, mime.to_string())], bytes))
}
