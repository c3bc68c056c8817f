use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Error, PostFilter, Store};
use crate::{
	policy,
	route::{
		auth::model::{NewUser, Session, UpdateUser, User},
		category::model::{Category, Location, NewCategory, NewLocation},
		comment::model::{Comment, CommentView, CreateComment, UpdateComment},
		model::{Page, Paginate},
		post::model::{Author, CategorySummary, LocationSummary, Post, PostInput, PostView},
	},
};

#[derive(Default)]
struct Tables {
	users: HashMap<Uuid, User>,
	sessions: HashMap<Uuid, Session>,
	categories: BTreeMap<i64, Category>,
	locations: BTreeMap<i64, Location>,
	posts: BTreeMap<i64, Post>,
	comments: BTreeMap<i64, Comment>,
	sequence: i64,
}

impl Tables {
	fn next_id(&mut self) -> i64 {
		self.sequence += 1;
		self.sequence
	}

	/// Joins a post with its author, category, location and comment count.
	fn view(&self, post: &Post) -> Option<PostView> {
		let author = self.users.get(&post.author_id)?;
		let category = post
			.category_id
			.and_then(|id| self.categories.get(&id))
			.map(|category| CategorySummary {
				id: category.id,
				title: category.title.clone(),
				slug: category.slug.clone(),
				is_published: category.is_published,
			});
		let location = post
			.location_id
			.and_then(|id| self.locations.get(&id))
			.map(|location| LocationSummary {
				id: location.id,
				name: location.name.clone(),
				is_published: location.is_published,
			});
		let comment_count = self
			.comments
			.values()
			.filter(|comment| comment.post_id == post.id)
			.count();

		Some(PostView {
			id: post.id,
			title: post.title.clone(),
			text: post.text.clone(),
			pub_date: post.pub_date,
			is_published: post.is_published,
			image: post.image.clone(),
			created_at: post.created_at,
			author: Author::from(author),
			category,
			location,
			comment_count: i64::try_from(comment_count).unwrap_or(i64::MAX),
		})
	}

	/// Mirrors the foreign keys of the post table.
	fn check_references(&self, input: &PostInput) -> Result<(), Error> {
		if let Some(id) = input.category_id {
			if !self.categories.contains_key(&id) {
				return Err(Error::UnknownReference("category_id"));
			}
		}

		if let Some(id) = input.location_id {
			if !self.locations.contains_key(&id) {
				return Err(Error::UnknownReference("location_id"));
			}
		}

		Ok(())
	}

	/// Mirrors the unique constraints of the user table.
	fn check_unique(&self, id: Uuid, email: Option<&str>, username: Option<&str>) -> Result<(), Error> {
		for user in self.users.values().filter(|user| user.id != id) {
			if email == Some(user.email.as_str()) {
				return Err(Error::EmailTaken);
			}

			if username == Some(user.username.as_str()) {
				return Err(Error::UsernameTaken);
			}
		}

		Ok(())
	}
}

/// A store that keeps everything in process memory.
///
/// Data is lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
	tables: RwLock<Tables>,
}

#[cfg(test)]
impl MemoryStore {
	pub async fn post_count(&self) -> usize {
		self.tables.read().await.posts.len()
	}

	pub async fn comment_count(&self) -> usize {
		self.tables.read().await.comments.len()
	}
}

fn to_usize(value: i64) -> usize {
	usize::try_from(value).unwrap_or(usize::MAX)
}

#[axum::async_trait]
impl Store for MemoryStore {
	async fn create_user(&self, user: NewUser) -> Result<User, Error> {
		let mut tables = self.tables.write().await;

		tables.check_unique(user.id, Some(&user.email), Some(&user.username))?;

		let user = User {
			id: user.id,
			email: user.email,
			password: user.password,
			username: user.username,
			first_name: user.first_name,
			last_name: user.last_name,
			created_at: Utc::now(),
		};

		tables.users.insert(user.id, user.clone());
		Ok(user)
	}

	async fn user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
		let tables = self.tables.read().await;

		Ok(tables
			.users
			.values()
			.find(|user| user.email == email)
			.cloned())
	}

	async fn user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
		let tables = self.tables.read().await;

		Ok(tables
			.users
			.values()
			.find(|user| user.username == username)
			.cloned())
	}

	async fn update_user(&self, id: Uuid, input: &UpdateUser) -> Result<User, Error> {
		let mut tables = self.tables.write().await;

		tables.check_unique(id, input.email.as_deref(), input.username.as_deref())?;

		let user = tables
			.users
			.get_mut(&id)
			.ok_or(Error::Database(sqlx::Error::RowNotFound))?;

		if let Some(email) = &input.email {
			user.email.clone_from(email);
		}
		if let Some(username) = &input.username {
			user.username.clone_from(username);
		}
		if let Some(first_name) = &input.first_name {
			user.first_name.clone_from(first_name);
		}
		if let Some(last_name) = &input.last_name {
			user.last_name.clone_from(last_name);
		}

		Ok(user.clone())
	}

	async fn create_session(&self, user_id: Uuid) -> Result<Session, Error> {
		let session = Session {
			id: Uuid::new_v4(),
			user_id,
			created_at: Utc::now(),
		};

		self.tables
			.write()
			.await
			.sessions
			.insert(session.id, session.clone());

		Ok(session)
	}

	async fn session_user(&self, session_id: Uuid) -> Result<Option<User>, Error> {
		let tables = self.tables.read().await;

		Ok(tables
			.sessions
			.get(&session_id)
			.and_then(|session| tables.users.get(&session.user_id))
			.cloned())
	}

	async fn delete_session(&self, session_id: Uuid) -> Result<(), Error> {
		self.tables.write().await.sessions.remove(&session_id);

		Ok(())
	}

	async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, Error> {
		let tables = self.tables.read().await;

		Ok(tables
			.categories
			.values()
			.find(|category| category.slug == slug)
			.cloned())
	}

	async fn upsert_category(&self, input: &NewCategory) -> Result<Category, Error> {
		let mut tables = self.tables.write().await;

		if let Some(category) = tables
			.categories
			.values_mut()
			.find(|category| category.slug == input.slug)
		{
			category.title.clone_from(&input.title);
			category.description.clone_from(&input.description);
			category.is_published = input.is_published;

			return Ok(category.clone());
		}

		let category = Category {
			id: tables.next_id(),
			title: input.title.clone(),
			description: input.description.clone(),
			slug: input.slug.clone(),
			is_published: input.is_published,
			created_at: Utc::now(),
		};

		tables.categories.insert(category.id, category.clone());
		Ok(category)
	}

	async fn upsert_location(&self, input: &NewLocation) -> Result<Location, Error> {
		let mut tables = self.tables.write().await;

		if let Some(location) = tables
			.locations
			.values_mut()
			.find(|location| location.name == input.name)
		{
			location.is_published = input.is_published;

			return Ok(location.clone());
		}

		let location = Location {
			id: tables.next_id(),
			name: input.name.clone(),
			is_published: input.is_published,
			created_at: Utc::now(),
		};

		tables.locations.insert(location.id, location.clone());
		Ok(location)
	}

	async fn list_posts(
		&self,
		filter: PostFilter,
		paginate: Paginate,
	) -> Result<Page<PostView>, Error> {
		let tables = self.tables.read().await;

		let mut posts = tables
			.posts
			.values()
			.filter(|post| filter.author_id.map_or(true, |id| post.author_id == id))
			.filter(|post| filter.category_id.map_or(true, |id| post.category_id == Some(id)))
			.filter_map(|post| tables.view(post))
			.filter(|post| {
				filter
					.visible_at
					.map_or(true, |now| policy::is_visible(post, now))
			})
			.collect::<Vec<_>>();

		posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));

		let total = i64::try_from(posts.len()).unwrap_or(i64::MAX);
		let items = posts
			.into_iter()
			.skip(to_usize(paginate.offset()))
			.take(to_usize(paginate.limit()))
			.collect();

		Ok(Page::new(items, paginate, total))
	}

	async fn post(&self, id: i64) -> Result<Option<PostView>, Error> {
		let tables = self.tables.read().await;

		Ok(tables.posts.get(&id).and_then(|post| tables.view(post)))
	}

	async fn create_post(&self, author_id: Uuid, input: &PostInput) -> Result<Post, Error> {
		let mut tables = self.tables.write().await;

		tables.check_references(input)?;

		let post = Post {
			id: tables.next_id(),
			author_id,
			title: input.title.clone(),
			text: input.text.clone(),
			pub_date: input.pub_date.0,
			is_published: input.is_published,
			image: input.image.clone(),
			location_id: input.location_id,
			category_id: input.category_id,
			created_at: Utc::now(),
		};

		tables.posts.insert(post.id, post.clone());
		Ok(post)
	}

	async fn update_post(&self, id: i64, input: &PostInput) -> Result<Option<Post>, Error> {
		let mut tables = self.tables.write().await;

		tables.check_references(input)?;

		let Some(post) = tables.posts.get_mut(&id) else {
			return Ok(None);
		};

		post.title.clone_from(&input.title);
		post.text.clone_from(&input.text);
		post.pub_date = input.pub_date.0;
		post.is_published = input.is_published;
		post.image.clone_from(&input.image);
		post.location_id = input.location_id;
		post.category_id = input.category_id;

		Ok(Some(post.clone()))
	}

	async fn delete_post(&self, id: i64) -> Result<bool, Error> {
		let mut tables = self.tables.write().await;

		if tables.posts.remove(&id).is_none() {
			return Ok(false);
		}

		tables.comments.retain(|_, comment| comment.post_id != id);
		Ok(true)
	}

	async fn comments(&self, post_id: i64) -> Result<Vec<CommentView>, Error> {
		let tables = self.tables.read().await;

		let mut comments = tables
			.comments
			.values()
			.filter(|comment| comment.post_id == post_id)
			.filter_map(|comment| {
				let author = tables.users.get(&comment.author_id)?;

				Some(CommentView {
					id: comment.id,
					post_id: comment.post_id,
					text: comment.text.clone(),
					created_at: comment.created_at,
					author: Author::from(author),
				})
			})
			.collect::<Vec<_>>();

		comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

		Ok(comments)
	}

	async fn comment(&self, post_id: i64, comment_id: i64) -> Result<Option<Comment>, Error> {
		let tables = self.tables.read().await;

		Ok(tables
			.comments
			.get(&comment_id)
			.filter(|comment| comment.post_id == post_id)
			.cloned())
	}

	async fn create_comment(
		&self,
		post_id: i64,
		author_id: Uuid,
		input: &CreateComment,
	) -> Result<Option<Comment>, Error> {
		let mut tables = self.tables.write().await;

		if !tables.posts.contains_key(&post_id) {
			return Ok(None);
		}

		let comment = Comment {
			id: tables.next_id(),
			post_id,
			author_id,
			text: input.text.clone(),
			created_at: Utc::now(),
		};

		tables.comments.insert(comment.id, comment.clone());
		Ok(Some(comment))
	}

	async fn update_comment(
		&self,
		id: i64,
		input: &UpdateComment,
	) -> Result<Option<Comment>, Error> {
		let mut tables = self.tables.write().await;

		let Some(comment) = tables.comments.get_mut(&id) else {
			return Ok(None);
		};

		if let Some(text) = &input.text {
			comment.text.clone_from(text);
		}

		Ok(Some(comment.clone()))
	}

	async fn delete_comment(&self, id: i64) -> Result<bool, Error> {
		Ok(self.tables.write().await.comments.remove(&id).is_some())
	}
}
