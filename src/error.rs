use std::{borrow::Cow, convert::Infallible};

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::rejection::{BytesRejection, JsonRejection, PathRejection, QueryRejection},
	http::{Response, StatusCode},
	response::IntoResponse,
	Json,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::store;

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single client-facing error.
///
/// `code` is stable and machine readable, `content` is a human readable
/// explanation and `field` names the offending input field, if any.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message<'a> {
	pub code: Cow<'a, str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub content: Option<Cow<'a, str>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'a, str>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Map>,
}

impl Message<'static> {
	pub fn new(code: impl Into<Cow<'static, str>>) -> Self {
		Self {
			code: code.into(),
			content: None,
			field: None,
			details: None,
		}
	}

	pub fn content(mut self, content: impl Into<Cow<'static, str>>) -> Self {
		self.content = Some(content.into());
		self
	}

	pub fn field(mut self, field: impl Into<Cow<'static, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	pub fn detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
		self.details
			.get_or_insert_with(Map::new)
			.insert(key.to_owned(), value.into());
		self
	}

	pub fn into_vec(self) -> Vec<Self> {
		vec![self]
	}
}

/// The body of every error response.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorResponse {
	pub errors: Vec<Message<'static>>,
}

/// Describes how a route module's error is presented to the client.
///
/// The [`std::fmt::Display`] output is never sent to the client, so it can
/// contain sensitive information.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn into_errors(self) -> Vec<Message<'static>>;
}

impl ErrorShape for Infallible {
	fn status(&self) -> StatusCode {
		match *self {}
	}

	fn into_errors(self) -> Vec<Message<'static>> {
		match self {}
	}
}

/// An error returned from a route: either the route module's own error,
/// or one of the errors every route can produce.
#[derive(Debug, thiserror::Error)]
pub enum RouteError<T: ErrorShape> {
	#[error(transparent)]
	Route(T),
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json error: {0}")]
	Json(#[from] JsonRejection),
	#[error("body error: {0}")]
	Bytes(#[from] BytesRejection),
	#[error("body error: {0}")]
	Body(#[from] serde_json::Error),
	#[error("query error: {0}")]
	Query(#[from] QueryRejection),
	#[error("path error: {0}")]
	Path(#[from] PathRejection),
	#[error("store error: {0}")]
	Store(#[from] store::Error),
}

/// The rejection used by extractors that do not belong to a route module.
pub type AppError = RouteError<Infallible>;

impl<T: ErrorShape> From<T> for RouteError<T> {
	fn from(error: T) -> Self {
		Self::Route(error)
	}
}

fn validation_errors(errors: &validator::ValidationErrors) -> Vec<Message<'static>> {
	let mut messages = errors
		.field_errors()
		.into_iter()
		.flat_map(|(field, errors)| {
			errors.iter().map(move |error| {
				let message = Message::new(error.code.to_string()).field(field.to_string());

				match &error.message {
					Some(content) => message.content(content.to_string()),
					None => message,
				}
			})
		})
		.collect::<Vec<_>>();

	// HashMap order is random, keep responses stable
	messages.sort_by(|a, b| a.field.cmp(&b.field));
	messages
}

impl<T: ErrorShape> RouteError<T> {
	fn status(&self) -> StatusCode {
		match self {
			Self::Route(error) => error.status(),
			Self::Validation(..)
			| Self::Json(..)
			| Self::Bytes(..)
			| Self::Body(..)
			| Self::Query(..) => StatusCode::BAD_REQUEST,
			Self::Path(..) => StatusCode::NOT_FOUND,
			Self::Store(error) => match error {
				store::Error::UsernameTaken | store::Error::EmailTaken => StatusCode::CONFLICT,
				store::Error::UnknownReference(..) => StatusCode::BAD_REQUEST,
				store::Error::Database(..) | store::Error::Migrate(..) => {
					StatusCode::INTERNAL_SERVER_ERROR
				}
			},
		}
	}

	fn into_errors(self) -> Vec<Message<'static>> {
		match self {
			Self::Route(error) => error.into_errors(),
			Self::Validation(errors) => validation_errors(&errors),
			Self::Json(error) => Message::new("invalid_body")
				.content(error.body_text())
				.into_vec(),
			Self::Bytes(error) => Message::new("invalid_body")
				.content(error.body_text())
				.into_vec(),
			Self::Body(error) => Message::new("invalid_body")
				.content(error.to_string())
				.into_vec(),
			Self::Query(error) => Message::new("invalid_query")
				.content(error.body_text())
				.into_vec(),
			Self::Path(error) => Message::new("not_found")
				.content(error.body_text())
				.into_vec(),
			Self::Store(store::Error::UsernameTaken) => Message::new("username_taken")
				.content("This username is already taken.")
				.field("username")
				.into_vec(),
			Self::Store(store::Error::EmailTaken) => Message::new("email_taken")
				.content("This email is already taken.")
				.field("email")
				.into_vec(),
			Self::Store(store::Error::UnknownReference(field)) => Message::new("invalid_choice")
				.content("Select a valid choice.")
				.field(field)
				.into_vec(),
			Self::Store(error) => {
				tracing::error!(%error, "store failure");

				Message::new("internal_error").into_vec()
			}
		}
	}
}

impl<T: ErrorShape> IntoResponse for RouteError<T> {
	fn into_response(self) -> Response<Body> {
		let status = self.status();

		(
			status,
			Json(ErrorResponse {
				errors: self.into_errors(),
			}),
		)
			.into_response()
	}
}

impl<T: ErrorShape> OperationOutput for RouteError<T> {
	type Inner = ErrorResponse;
}
