use cookie::{Cookie, SameSite};
use uuid::Uuid;

pub const COOKIE_NAME: &str = "session";

/// Creates a session cookie with no expiry.
///
/// The cookie is only marked secure in release builds so that the service
/// can be used over plain HTTP locally.
pub fn create_cookie(session_id: Uuid) -> Cookie<'static> {
	Cookie::build((COOKIE_NAME, session_id.to_string()))
		.secure(!cfg!(debug_assertions))
		.http_only(true)
		.same_site(SameSite::Lax)
		.path("/")
		.into()
}

/// Creates an empty session cookie used to invalidate a previous one
pub fn clear_cookie() -> Cookie<'static> {
	Cookie::build(COOKIE_NAME)
		.http_only(true)
		.path("/")
		.max_age(cookie::time::Duration::ZERO)
		.into()
}

/// Finds the session id in a `Cookie` header value, if there is a well-formed one.
pub fn find_session_id<'a>(headers: impl Iterator<Item = &'a str>) -> Option<Uuid> {
	headers
		.flat_map(Cookie::split_parse)
		.filter_map(Result::ok)
		.find(|cookie| cookie.name() == COOKIE_NAME)
		.and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_find_session_id() {
		let id = Uuid::new_v4();
		let header = format!("theme=dark; {COOKIE_NAME}={id}");

		assert_eq!(find_session_id([header.as_str()].into_iter()), Some(id));
		assert_eq!(find_session_id(["theme=dark"].into_iter()), None);
		assert_eq!(
			find_session_id([format!("{COOKIE_NAME}=garbage").as_str()].into_iter()),
			None
		);
	}

	#[test]
	fn test_clear_cookie_expires_immediately() {
		let cookie = clear_cookie();

		assert_eq!(cookie.name(), COOKIE_NAME);
		assert_eq!(cookie.max_age(), Some(cookie::time::Duration::ZERO));
	}
}
