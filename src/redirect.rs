use aide::{
	gen::GenContext,
	openapi::{Operation, Response as ApiResponse},
	OperationOutput,
};
use axum::{
	body::Body,
	http::{header, Response, StatusCode},
	response::IntoResponse,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything but the characters a username may contain unescaped in a path.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
	.remove(b'-')
	.remove(b'.')
	.remove(b'_')
	.remove(b'@')
	.remove(b'+');

/// A `303 See Other` response pointing at one of the canonical pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
	location: String,
}

impl Redirect {
	/// The detail page of a post.
	pub fn post(post_id: i64) -> Self {
		Self {
			location: format!("/posts/{post_id}"),
		}
	}

	/// The profile page of a user.
	pub fn profile(username: &str) -> Self {
		Self {
			location: format!("/profile/{}", utf8_percent_encode(username, PATH_SEGMENT)),
		}
	}

	pub fn location(&self) -> &str {
		&self.location
	}
}

impl IntoResponse for Redirect {
	fn into_response(self) -> Response<Body> {
		(StatusCode::SEE_OTHER, [(header::LOCATION, self.location)]).into_response()
	}
}

impl OperationOutput for Redirect {
	type Inner = ();

	fn inferred_responses(
		_ctx: &mut GenContext,
		_operation: &mut Operation,
	) -> Vec<(Option<u16>, ApiResponse)> {
		vec![(
			Some(StatusCode::SEE_OTHER.as_u16()),
			ApiResponse {
				description: "Redirects to the canonical page of the resource.".into(),
				..Default::default()
			},
		)]
	}
}

/// Either the requested value, or a redirect for requesters who may not see it.
#[derive(Debug)]
pub enum OrRedirect<T> {
	Value(T),
	Redirect(Redirect),
}

impl<T> From<Redirect> for OrRedirect<T> {
	fn from(redirect: Redirect) -> Self {
		Self::Redirect(redirect)
	}
}

impl<T: IntoResponse> IntoResponse for OrRedirect<T> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::Value(value) => value.into_response(),
			Self::Redirect(redirect) => redirect.into_response(),
		}
	}
}

impl<T: OperationOutput> OperationOutput for OrRedirect<T> {
	type Inner = T::Inner;

	fn operation_response(ctx: &mut GenContext, operation: &mut Operation) -> Option<ApiResponse> {
		T::operation_response(ctx, operation)
	}

	fn inferred_responses(
		ctx: &mut GenContext,
		operation: &mut Operation,
	) -> Vec<(Option<u16>, ApiResponse)> {
		let mut responses = T::inferred_responses(ctx, operation);

		responses.extend(Redirect::inferred_responses(ctx, operation));
		responses
	}
}
