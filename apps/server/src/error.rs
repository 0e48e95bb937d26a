//! JSON error envelope: every failure renders as `{"error": message}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use mb_core::images::ImageError;
use mb_core::mapping::MappingError;
use mb_core::session::SessionError;

pub struct ApiError {
	status: StatusCode,
	message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
	pub fn bad_request(message: impl Into<String>) -> Self {
		Self {
			status: StatusCode::BAD_REQUEST,
			message: message.into(),
		}
	}

	pub fn not_found(message: impl Into<String>) -> Self {
		Self {
			status: StatusCode::NOT_FOUND,
			message: message.into(),
		}
	}

	pub fn internal(message: impl Into<String>) -> Self {
		Self {
			status: StatusCode::INTERNAL_SERVER_ERROR,
			message: message.into(),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		(self.status, Json(json!({ "error": self.message }))).into_response()
	}
}

impl From<MappingError> for ApiError {
	fn from(err: MappingError) -> Self {
		use MappingError::*;
		let status = match &err {
			ParentNotFound(_) | NotFound(_) | Untracked(_) | NotInParent => StatusCode::NOT_FOUND,
			NotAFolder(_) | DuplicateName(_) | NotMarkdown(_) | InvalidPosition(_) => {
				StatusCode::BAD_REQUEST
			}
			PermissionDenied(_) => StatusCode::FORBIDDEN,
			Database(_) | Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
		};
		Self {
			status,
			message: err.to_string(),
		}
	}
}

impl From<SessionError> for ApiError {
	fn from(err: SessionError) -> Self {
		use SessionError::*;
		match err {
			Mapping(inner) => inner.into(),
			NotFound(_) | FolderMissing(_) => Self {
				status: StatusCode::NOT_FOUND,
				message: err.to_string(),
			},
			NameTaken(_) | InvalidName(_) => Self {
				status: StatusCode::BAD_REQUEST,
				message: err.to_string(),
			},
			PermissionDenied(_) => Self {
				status: StatusCode::FORBIDDEN,
				message: err.to_string(),
			},
			Tool(_) | Database(_) | Io(_) => Self {
				status: StatusCode::INTERNAL_SERVER_ERROR,
				message: err.to_string(),
			},
		}
	}
}

impl From<ImageError> for ApiError {
	fn from(err: ImageError) -> Self {
		use ImageError::*;
		let status = match &err {
			NotFound(_) => StatusCode::NOT_FOUND,
			UnsupportedExtension(_) | InvalidFilename(_) => StatusCode::BAD_REQUEST,
			Fetch(_) | Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
		};
		Self {
			status,
			message: err.to_string(),
		}
	}
}
