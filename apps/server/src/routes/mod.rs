use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use mb_core::Core;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

mod export;
mod files;
mod images;
mod sessions;

pub fn router(core: Arc<Core>) -> Router {
	let api = Router::new()
		.route(
			"/create-website-session",
			post(sessions::create_website_session),
		)
		.route("/get-folder-session", get(sessions::get_folder_session))
		.route("/get-all-sessions", get(sessions::get_all_sessions))
		.route("/edit-session", post(sessions::edit_session))
		.route("/delete-session", post(sessions::delete_session))
		.route("/read-folder", post(files::read_folder))
		.route("/file-content", get(files::file_content))
		.route("/save-file", post(files::save_file))
		.route("/create-file", post(files::create_file))
		.route("/create-folder", post(files::create_folder))
		.route("/upload-file", post(files::upload_file))
		.route("/delete-item", post(files::delete_item))
		.route("/rename-item", post(files::rename_item))
		.route("/reorder-items", post(files::reorder_items))
		.route("/upload-image", post(images::upload_image))
		.route("/upload-image-from-url", post(images::upload_image_from_url))
		.route("/get-image/:filename", get(images::get_image))
		.route("/export-book", post(export::export_book))
		.route("/export-pdf", post(export::export_pdf))
		.route("/export-summary", post(export::export_summary));

	Router::new()
		.route("/", get(|| async { "Markbook Server!" }))
		.route("/health", get(|| async { "OK" }))
		.nest("/api", api)
		.nest_service("/public", ServeDir::new("public"))
		.nest_service("/assets", ServeDir::new("dist/assets"))
		.fallback(|| async { (StatusCode::NOT_FOUND, "404 Not Found") })
		.layer(CorsLayer::permissive())
		.layer(DefaultBodyLimit::max(50 * 1024 * 1024))
		.with_state(core)
}
