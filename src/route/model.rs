use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// These can be removed when [`serde`] supports
/// literal defaults: <https://github.com/serde-rs/serde/issues/368>
#[inline]
fn one() -> i64 {
	1
}

#[inline]
fn ten() -> i64 {
	10
}

#[derive(Debug, Clone, Copy, Deserialize, Validate, JsonSchema)]
pub struct Paginate {
	/// The page number to return (1-indexed).
	#[validate(range(min = 1, max = 100_000))]
	#[serde(default = "one")]
	pub page: i64,
	/// The number of items to return per page.
	#[validate(range(min = 1, max = 100))]
	#[serde(default = "ten")]
	pub size: i64,
}

impl Default for Paginate {
	fn default() -> Self {
		Self {
			page: one(),
			size: ten(),
		}
	}
}

impl Paginate {
	pub fn offset(&self) -> i64 {
		(self.page - 1) * self.size
	}

	pub fn limit(&self) -> i64 {
		self.size
	}
}

/// One page of a longer list.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Page<T> {
	pub items: Vec<T>,
	/// The current page number (1-indexed).
	pub page: i64,
	pub size: i64,
	/// The number of items across all pages.
	pub total: i64,
	/// The number of pages, at least 1.
	pub pages: i64,
}

impl<T> Page<T> {
	pub fn new(items: Vec<T>, paginate: Paginate, total: i64) -> Self {
		Self {
			items,
			page: paginate.page,
			size: paginate.size,
			total,
			pages: ((total + paginate.size - 1) / paginate.size).max(1),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_paginate_offset() {
		let mut paginate = Paginate { page: 1, size: 10 };

		assert_eq!(paginate.offset(), 0);

		paginate.page = 2;

		assert_eq!(paginate.offset(), 10);

		paginate.size = 5;

		assert_eq!(paginate.offset(), 5);

		paginate.page = 3;

		assert_eq!(paginate.offset(), 10);
	}

	#[test]
	fn test_paginate_limit() {
		let paginate = Paginate { page: 1, size: 10 };

		assert_eq!(paginate.limit(), 10);
	}

	#[test]
	fn test_page_count() {
		let paginate = Paginate::default();

		assert_eq!(Page::<()>::new(Vec::new(), paginate, 0).pages, 1);
		assert_eq!(Page::<()>::new(Vec::new(), paginate, 10).pages, 1);
		assert_eq!(Page::<()>::new(Vec::new(), paginate, 11).pages, 2);
	}
}
