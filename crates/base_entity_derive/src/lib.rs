//! `#[base_entity]` fills in the columns every persisted record shares: a UUID primary key,
//! `created_at`, and (unless the record is append-only) `updated_at`.
//!
//! ```ignore
//! #[base_entity]                       // id + created_at + updated_at
//! #[base_entity(timestamps = "created")] // id + created_at only
//! ```

use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashSet;
use syn::{
    Expr, ExprLit, Fields, Ident, ItemStruct, Lit, LitStr, Meta, Path, Token, parse_macro_input,
    parse_str, punctuated::Punctuated,
};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Timestamps {
    CreatedAndUpdated,
    CreatedOnly,
}

struct EntityShape {
    traits_path: Path,
    active_model: Ident,
    id: Ident,
    created_at: Ident,
    updated_at: Ident,
    timestamps: Timestamps,
}

impl EntityShape {
    fn new() -> syn::Result<Self> {
        let span = proc_macro2::Span::call_site();
        Ok(Self {
            traits_path: parse_str("crate::db::dao::base_traits")?,
            active_model: Ident::new("ActiveModel", span),
            id: Ident::new("id", span),
            created_at: Ident::new("created_at", span),
            updated_at: Ident::new("updated_at", span),
            timestamps: Timestamps::CreatedAndUpdated,
        })
    }
}

#[proc_macro_attribute]
pub fn base_entity(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr with Punctuated<Meta, Token![,]>::parse_terminated);
    let mut input = parse_macro_input!(item as ItemStruct);

    match expand(args, &mut input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(
    args: Punctuated<Meta, Token![,]>,
    input: &mut ItemStruct,
) -> syn::Result<proc_macro2::TokenStream> {
    let mut shape = EntityShape::new()?;
    for meta in args {
        apply_arg(&mut shape, meta)?;
    }

    let Fields::Named(fields) = &mut input.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "base_entity requires a struct with named fields",
        ));
    };

    let declared: HashSet<String> = fields
        .named
        .iter()
        .filter_map(|field| field.ident.as_ref().map(ToString::to_string))
        .collect();

    let mut injected: Punctuated<syn::Field, Token![,]> = Punctuated::new();

    if !declared.contains(&shape.id.to_string()) {
        let id = &shape.id;
        injected.push(syn::parse_quote! {
            #[sea_orm(primary_key, auto_increment = false)]
            pub #id: uuid::Uuid
        });
    }

    if !declared.contains(&shape.created_at.to_string()) {
        let created_at = &shape.created_at;
        injected.push(syn::parse_quote! {
            #[sea_orm(default_expr = "Expr::current_timestamp()")]
            pub #created_at: sea_orm::entity::prelude::DateTimeWithTimeZone
        });
    }

    let tracks_updates = shape.timestamps == Timestamps::CreatedAndUpdated;
    if tracks_updates && !declared.contains(&shape.updated_at.to_string()) {
        let updated_at = &shape.updated_at;
        injected.push(syn::parse_quote! {
            #[sea_orm(default_expr = "Expr::current_timestamp()")]
            pub #updated_at: sea_orm::entity::prelude::DateTimeWithTimeZone
        });
    }

    injected.extend(fields.named.iter().cloned());
    fields.named = injected;

    let EntityShape {
        traits_path,
        active_model,
        id,
        created_at,
        updated_at,
        ..
    } = shape;

    let set_updated_at = if tracks_updates {
        quote! { self.#updated_at = sea_orm::ActiveValue::Set(ts); }
    } else {
        // append-only rows have no updated_at column
        quote! { let _ = ts; }
    };

    Ok(quote! {
        #input

        impl #traits_path::HasIdActiveModel for #active_model {
            fn set_id(&mut self, id: uuid::Uuid) {
                self.#id = sea_orm::ActiveValue::Set(id);
            }
        }

        impl #traits_path::TimestampedActiveModel for #active_model {
            fn set_created_at(&mut self, ts: sea_orm::entity::prelude::DateTimeWithTimeZone) {
                self.#created_at = sea_orm::ActiveValue::Set(ts);
            }

            fn set_updated_at(&mut self, ts: sea_orm::entity::prelude::DateTimeWithTimeZone) {
                #set_updated_at
            }
        }

        impl #traits_path::HasCreatedAtColumn for Entity {
            fn created_at_column() -> Column {
                Column::CreatedAt
            }
        }
    })
}

fn apply_arg(shape: &mut EntityShape, meta: Meta) -> syn::Result<()> {
    let Meta::NameValue(name_value) = meta else {
        return Err(syn::Error::new_spanned(
            meta,
            "expected key = \"value\", e.g. timestamps = \"created\"",
        ));
    };

    let Some(key) = name_value.path.get_ident().map(ToString::to_string) else {
        return Err(syn::Error::new_spanned(
            name_value.path,
            "expected simple identifier for attribute key",
        ));
    };

    let value = string_literal(name_value.value)?;

    match key.as_str() {
        "traits" => {
            shape.traits_path = value.parse::<Path>().map_err(|err| {
                syn::Error::new(value.span(), format!("invalid traits path: {err}"))
            })?;
        }
        "active_model" => shape.active_model = Ident::new(&value.value(), value.span()),
        "id" => shape.id = Ident::new(&value.value(), value.span()),
        "created_at" => shape.created_at = Ident::new(&value.value(), value.span()),
        "updated_at" => shape.updated_at = Ident::new(&value.value(), value.span()),
        "timestamps" => {
            shape.timestamps = match value.value().as_str() {
                "all" => Timestamps::CreatedAndUpdated,
                "created" => Timestamps::CreatedOnly,
                other => {
                    return Err(syn::Error::new(
                        value.span(),
                        format!(
                            "unknown timestamps mode `{other}` (expected \"all\" or \"created\")"
                        ),
                    ));
                }
            };
        }
        _ => {
            return Err(syn::Error::new(
                value.span(),
                format!("unknown base_entity attribute key `{key}`"),
            ));
        }
    }

    Ok(())
}

fn string_literal(expr: Expr) -> syn::Result<LitStr> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(lit), ..
        }) => Ok(lit),
        other => Err(syn::Error::new_spanned(
            other,
            "expected string literal for attribute value",
        )),
    }
}
