use aide::{
	openapi::{ApiKeyLocation, SecurityScheme, Tag},
	transform::TransformOpenApi,
};

use crate::{error, extract::Json, session};

pub const SECURITY_SCHEME_SESSION: &str = "Session";

pub mod tag {
	pub const AUTH: &str = "Auth";
	pub const POST: &str = "Post";
	pub const COMMENT: &str = "Comment";
	pub const CATEGORY: &str = "Category";
	pub const PROFILE: &str = "Profile";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Blogicum")
		.summary("A blog with categories, locations and comments")
		.description(
			"Posts are public once published, past their publication date and filed \
			 under a published category (or none). Authors always see their own posts \
			 and are the only ones who may change them.",
		)
		.tag(Tag {
			name: tag::AUTH.into(),
			description: Some("User authentication".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::POST.into(),
			description: Some("Publishing and reading posts".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::COMMENT.into(),
			description: Some("Comments on posts".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::CATEGORY.into(),
			description: Some("Posts filed under a category".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::PROFILE.into(),
			description: Some("User profiles and their posts".into()),
			..Default::default()
		})
		.security_scheme(
			SECURITY_SCHEME_SESSION,
			SecurityScheme::ApiKey {
				location: ApiKeyLocation::Cookie,
				name: session::COOKIE_NAME.into(),
				description: Some("A user session cookie".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<error::ErrorResponse>, _>(|res| {
			res.example(error::ErrorResponse {
				errors: error::Message::new("error_code")
					.content("error message")
					.field("optional field")
					.detail("key", "value")
					.into_vec(),
			})
		})
}
