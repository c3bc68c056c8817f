//! Visibility and ownership rules shared by every handler.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
	redirect::Redirect,
	route::{auth::model::User, comment::model::Comment, post::model::PostView},
};

/// Returns true if `post` may be shown to someone other than its author at `now`.
///
/// A post is visible when it is published, its publication date has passed
/// and its category, if it has one, is published too.
pub fn is_visible(post: &PostView, now: DateTime<Utc>) -> bool {
	post.is_published
		&& post.pub_date <= now
		&& post
			.category
			.as_ref()
			.map_or(true, |category| category.is_published)
}

/// A resource that only its owner may change.
pub trait Owned {
	fn owner(&self) -> Uuid;

	/// Where to send a user after they tried to change the resource, allowed or not.
	fn canonical(&self) -> Redirect;
}

impl Owned for PostView {
	fn owner(&self) -> Uuid {
		self.author.id
	}

	fn canonical(&self) -> Redirect {
		Redirect::post(self.id)
	}
}

impl Owned for Comment {
	fn owner(&self) -> Uuid {
		self.author_id
	}

	fn canonical(&self) -> Redirect {
		Redirect::post(self.post_id)
	}
}

impl Owned for User {
	fn owner(&self) -> Uuid {
		self.id
	}

	fn canonical(&self) -> Redirect {
		Redirect::profile(&self.username)
	}
}

pub fn can_modify(actor: &User, resource: &impl Owned) -> bool {
	actor.id == resource.owner()
}

/// Runs `mutate` on `resource` if `actor` owns it.
///
/// Otherwise nothing is changed and the actor is redirected to the
/// resource's canonical location.
pub async fn authorize_then<R, F, Fut, T, E>(actor: &User, resource: R, mutate: F) -> Result<T, E>
where
	R: Owned,
	F: FnOnce(R) -> Fut,
	Fut: Future<Output = Result<T, E>>,
	T: From<Redirect>,
{
	if !can_modify(actor, &resource) {
		let redirect = resource.canonical();

		tracing::info!(
			actor = %actor.id,
			owner = %resource.owner(),
			location = redirect.location(),
			"refusing to modify a resource owned by someone else"
		);

		return Ok(redirect.into());
	}

	mutate(resource).await
}

#[cfg(test)]
mod test {
	use chrono::Duration;

	use super::*;
	use crate::route::post::model::{Author, CategorySummary};

	fn post(is_published: bool, pub_date: DateTime<Utc>, category: Option<bool>) -> PostView {
		PostView {
			id: 1,
			title: "title".into(),
			text: "text".into(),
			pub_date,
			is_published,
			image: None,
			created_at: pub_date,
			author: Author {
				id: Uuid::new_v4(),
				username: "author".into(),
				first_name: String::new(),
				last_name: String::new(),
			},
			category: category.map(|is_published| CategorySummary {
				id: 1,
				title: "category".into(),
				slug: "category".into(),
				is_published,
			}),
			location: None,
			comment_count: 0,
		}
	}

	fn user(id: Uuid) -> User {
		User {
			id,
			email: "user@example.com".into(),
			password: Vec::new(),
			username: "user".into(),
			first_name: String::new(),
			last_name: String::new(),
			created_at: Utc::now(),
		}
	}

	#[test]
	fn test_visibility_requires_every_condition() {
		let now = Utc::now();
		let past = now - Duration::hours(1);
		let future = now + Duration::hours(1);

		for is_published in [true, false] {
			for pub_date in [past, now, future] {
				for category in [None, Some(true), Some(false)] {
					let expected =
						is_published && pub_date <= now && category.unwrap_or(true);

					assert_eq!(
						is_visible(&post(is_published, pub_date, category), now),
						expected,
						"published={is_published} pub_date={pub_date} category={category:?}"
					);
				}
			}
		}
	}

	#[test]
	fn test_only_the_author_can_modify() {
		let post = post(true, Utc::now(), None);

		assert!(can_modify(&user(post.author.id), &post));
		assert!(!can_modify(&user(Uuid::new_v4()), &post));
	}

	#[tokio::test]
	async fn test_authorize_then_skips_mutation_for_strangers() {
		let post = post(true, Utc::now(), None);
		let stranger = user(Uuid::new_v4());

		let result: Result<Redirect, &str> =
			authorize_then(&stranger, post, |_| async { Err("mutation ran") }).await;

		assert_eq!(result.unwrap().location(), "/posts/1");
	}

	#[tokio::test]
	async fn test_authorize_then_runs_mutation_for_the_author() {
		let post = post(true, Utc::now(), None);
		let author = user(post.author.id);

		let result: Result<Redirect, ()> = authorize_then(&author, post, |post| async move {
			Ok(Redirect::profile(&post.author.username))
		})
		.await;

		assert_eq!(result.unwrap().location(), "/profile/author");
	}
}
