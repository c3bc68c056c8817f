use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub use crate::route::{
	auth::model::{UpdateUser, User},
	model::{Page, Paginate},
};
use crate::route::post::model::PostView;

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct ProfilePath {
	#[validate(length(min = 1, max = 150))]
	pub username: String,
}

/// A user and the posts they wrote.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ProfilePage {
	pub profile: User,
	/// Every post for the owner, the publicly visible ones for everyone else.
	pub posts: Page<PostView>,
}
