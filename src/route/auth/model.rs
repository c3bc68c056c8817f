use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Letters, digits and `@.+-_`, the same set most blog engines allow.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
	if username
		.chars()
		.any(|c| !c.is_alphanumeric() && !"@.+-_".contains(c))
	{
		return Err(ValidationError::new("username_characters"));
	}

	Ok(())
}

/// A single user.
#[model(update)]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
pub struct User {
	/// The unique identifier of the user.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The user's email address, used for logging in.
	#[serde(skip_serializing)]
	#[validate(email)]
	pub email: String,
	/// The hashed password.
	#[serde(skip)]
	pub password: Vec<u8>,
	/// The username that is displayed to the public.
	#[validate(length(min = 3, max = 150), custom(function = "validate_username"))]
	pub username: String,
	#[validate(length(max = 150))]
	pub first_name: String,
	#[validate(length(max = 150))]
	pub last_name: String,
	/// The creation time of the user.
	#[serde(skip_deserializing)]
	pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Session {
	/// The session id.
	#[serde(rename = "session_id")]
	pub id: Uuid,
	/// The user that owns the session.
	#[serde(skip)]
	pub user_id: Uuid,
	/// The creation time of the session.
	pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct LoginInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 8, max = 128))]
	pub password: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct RegisterInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 8, max = 128))]
	pub password: String,
	/// The username that is displayed to the public.
	#[validate(length(min = 3, max = 150), custom(function = "validate_username"))]
	pub username: String,
	#[serde(default)]
	#[validate(length(max = 150))]
	pub first_name: String,
	#[serde(default)]
	#[validate(length(max = 150))]
	pub last_name: String,
}

/// The fields a new account is stored with.
#[derive(Debug)]
pub struct NewUser {
	pub id: Uuid,
	pub email: String,
	pub password: Vec<u8>,
	pub username: String,
	pub first_name: String,
	pub last_name: String,
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_validate_username() {
		assert!(validate_username("john.smith+blog@home_1").is_ok());
		assert!(validate_username("john smith").is_err());
		assert!(validate_username("john/smith").is_err());
	}

	#[test]
	fn test_update_user_validates_present_fields_only() {
		let input = UpdateUser {
			email: None,
			username: Some("ok_name".into()),
			first_name: None,
			last_name: None,
		};

		assert!(input.validate().is_ok());

		let input = UpdateUser {
			email: Some("not an email".into()),
			username: None,
			first_name: None,
			last_name: None,
		};

		assert!(input.validate().is_err());
	}
}
