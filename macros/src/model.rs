use darling::{ast, FromDeriveInput, FromField, FromMeta};
use proc_macro2::{TokenStream, TokenTree};
use quote::{format_ident, quote, ToTokens};
use syn::{punctuated::Punctuated, Meta, Token};

#[derive(Debug, FromDeriveInput)]
#[darling(supports(struct_named), forward_attrs)]
struct ModelInputReceiver {
	ident: syn::Ident,

	generics: syn::Generics,

	data: ast::Data<(), ModelFieldReceiver>,

	attrs: Vec<syn::Attribute>,
}

#[derive(Debug, FromField)]
#[darling(forward_attrs)]
struct ModelFieldReceiver {
	ident: Option<syn::Ident>,

	ty: syn::Type,
	vis: syn::Visibility,

	attrs: Vec<syn::Attribute>,
}

#[derive(Debug, Default, FromMeta)]
struct ModelArgs {
	#[darling(default)]
	create: bool,
	#[darling(default)]
	update: bool,
}

/// Returns true for `#[serde(skip)]` and `#[serde(skip_deserializing)]`.
fn is_skipped(attr: &syn::Attribute) -> bool {
	let Meta::List(ref list) = attr.meta else {
		return false;
	};

	if !list.path.is_ident("serde") {
		return false;
	}

	list.tokens.to_token_stream().into_iter().any(|token| {
		matches!(token, TokenTree::Ident(ref ident) if ident == "skip_deserializing" || ident == "skip")
	})
}

/// Copies attributes onto a generated input struct, leaving out anything
/// that only makes sense on a database row.
fn input_attrs(attrs: &[syn::Attribute]) -> Vec<TokenStream> {
	attrs
		.iter()
		.filter(|attr| !attr.path().is_ident("sqlx"))
		.map(|attr| {
			if !attr.path().is_ident("derive") {
				return attr.to_token_stream();
			}

			let Ok(paths) =
				attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
			else {
				return attr.to_token_stream();
			};

			let paths = paths.into_iter().filter(|path| {
				path.segments
					.last()
					.map_or(true, |segment| segment.ident != "FromRow")
			});

			quote!(#[derive(#(#paths),*)])
		})
		.collect()
}

pub fn from_input(
	args: proc_macro::TokenStream,
	input: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
	let args = match ast::NestedMeta::parse_meta_list(args.into()) {
		Ok(x) => x,
		Err(e) => return e.into_compile_error().into(),
	};

	let args = match ModelArgs::from_list(&args) {
		Ok(x) => x,
		Err(e) => return e.write_errors().into(),
	};

	// Neither flag means both.
	let (create, update) = if args.create || args.update {
		(args.create, args.update)
	} else {
		(true, true)
	};

	let input = syn::parse_macro_input!(input as syn::DeriveInput);
	let receiver = match ModelInputReceiver::from_derive_input(&input) {
		Ok(x) => x,
		Err(e) => return e.write_errors().into(),
	};

	let ident = &receiver.ident;
	let vis = &input.vis;
	let generics = &receiver.generics;
	let create_ident = format_ident!("Create{}", ident);
	let update_ident = format_ident!("Update{}", ident);

	let attrs = input_attrs(&receiver.attrs);

	let Some(fields) = receiver.data.take_struct() else {
		return syn::Error::new_spanned(&input.ident, "#[model] expects a struct")
			.into_compile_error()
			.into();
	};

	let fields = fields
		.iter()
		.filter_map(|field| {
			let ident = field.ident.as_ref()?;

			if field.attrs.iter().any(is_skipped) {
				return None;
			}

			Some((input_attrs(&field.attrs), ident, &field.ty, &field.vis))
		})
		.collect::<Vec<_>>();

	let create_struct = create.then(|| {
		let fields = fields.iter().map(|(attrs, ident, ty, vis)| {
			quote! {
				#(#attrs)*
				#vis #ident: #ty,
			}
		});

		quote! {
			#(#attrs)*
			#vis struct #create_ident #generics {
				#(#fields)*
			}
		}
	});

	let update_struct = update.then(|| {
		let fields = fields.iter().map(|(attrs, ident, ty, vis)| {
			quote! {
				#(#attrs)*
				#vis #ident: Option<#ty>,
			}
		});

		quote! {
			#(#attrs)*
			#vis struct #update_ident #generics {
				#(#fields)*
			}
		}
	});

	quote! {
		#input

		#create_struct

		#update_struct
	}
	.into()
}
