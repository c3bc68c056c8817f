mod model;
mod route;

use proc_macro::TokenStream;

/// Generates a `<handler>_docs` function for the route, used to describe the
/// operation in the OpenAPI document.
///
/// The first line of the doc comment becomes the summary, the remaining lines
/// the description. `tag = ...` and `response(status = ..., shape = "...", description = "...")`
/// may be repeated.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Derives input structs from a model.
///
/// `#[model(create)]` emits `CreateX`, a copy of every deserializable field.
/// `#[model(update)]` emits `UpdateX`, the same fields wrapped in `Option`.
/// Without arguments, both are emitted. Fields marked with
/// `#[serde(skip_deserializing)]` or `#[serde(skip)]` are never copied.
#[proc_macro_attribute]
pub fn model(args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(args, input)
}
