//! Derive macro for the `Record` trait of `structmap`.
//!
//! This crate is re-exported by `structmap` behind its `derive` feature and
//! is not meant to be used directly.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Data, DeriveInput, Fields, Ident, Index, LitStr, Member, Type, ext::IdentExt,
    parse_macro_input,
};

/// Field-level attributes parsed from `#[mapper(...)]`.
#[derive(Debug, Default)]
struct FieldAttributes {
    /// Name the field is matched under instead of its own.
    alias: Option<String>,
    /// Whether the mapper must leave the field alone when writing.
    readonly: bool,
    /// Whether the field is left out of the record description entirely.
    skip: bool,
}

fn parse_field_attributes(field: &syn::Field) -> syn::Result<FieldAttributes> {
    let mut field_attrs = FieldAttributes::default();

    for attr in &field.attrs {
        if !attr.path().is_ident("mapper") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("alias") {
                let alias: LitStr = meta.value()?.parse()?;
                if alias.value().is_empty() {
                    return Err(meta.error("alias must not be empty"));
                }
                field_attrs.alias = Some(alias.value());
                Ok(())
            } else if meta.path.is_ident("readonly") {
                field_attrs.readonly = true;
                Ok(())
            } else if meta.path.is_ident("skip") {
                field_attrs.skip = true;
                Ok(())
            } else {
                Err(meta.error(
                    "unsupported mapper attribute, expected `alias = \"...\"`, `readonly` or `skip`",
                ))
            }
        })?;
    }

    Ok(field_attrs)
}

struct RecordField {
    member: Member,
    name: String,
    ty: Type,
    attrs: FieldAttributes,
}

fn collect_fields(fields: &Fields) -> syn::Result<Vec<RecordField>> {
    match fields {
        Fields::Named(fields) => fields
            .named
            .iter()
            .map(|field| -> syn::Result<RecordField> {
                let ident = field
                    .ident
                    .clone()
                    .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
                Ok(RecordField {
                    name: ident.unraw().to_string(),
                    member: Member::Named(ident),
                    ty: field.ty.clone(),
                    attrs: parse_field_attributes(field)?,
                })
            })
            .collect(),
        Fields::Unnamed(fields) => fields
            .unnamed
            .iter()
            .enumerate()
            .map(|(index, field)| -> syn::Result<RecordField> {
                Ok(RecordField {
                    name: index.to_string(),
                    member: Member::Unnamed(Index::from(index)),
                    ty: field.ty.clone(),
                    attrs: parse_field_attributes(field)?,
                })
            })
            .collect(),
        Fields::Unit => Ok(Vec::new()),
    }
}

/// Derive macro implementing `Record` and `Field` for a struct.
///
/// Fields are described in declaration order. Tuple struct fields are named
/// after their position (`"0"`, `"1"`, ...).
///
/// # Attributes
///
/// - `#[mapper(alias = "name")]` matches the field under `name` instead of its
///   own name.
/// - `#[mapper(readonly)]` keeps the mapper from writing the field.
/// - `#[mapper(skip)]` leaves the field out of the record: it is never read,
///   written or matched, and its type does not need to implement `Field`.
///   Use it for fields of foreign types that cannot be declared with
///   `structmap::elementary!`.
///
/// # Examples
///
/// ```compile_fail
/// use structmap::Record;
///
/// #[derive(Clone, Default, Record)]
/// struct Account {
///     id: u64,
///     #[mapper(alias = "login")]
///     name: String,
///     #[mapper(readonly)]
///     created_at: u64,
/// }
/// ```
#[proc_macro_derive(Record, attributes(mapper))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic types",
        ));
    }
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Record can only be derived for structs",
        ));
    };
    let fields: Vec<RecordField> = collect_fields(&data.fields)?
        .into_iter()
        .filter(|field| !field.attrs.skip)
        .collect();
    Ok(impl_record(&input.ident, &fields))
}

fn impl_record(name: &Ident, fields: &[RecordField]) -> TokenStream2 {
    let name_str = name.unraw().to_string();
    let members: Vec<&Member> = fields.iter().map(|field| &field.member).collect();
    let indices: Vec<usize> = (0..fields.len()).collect();

    let descriptors = fields.iter().map(|field| {
        let key = &field.name;
        let ty = &field.ty;
        let mut descriptor = quote! {
            ::structmap::FieldDescriptor::new(#key, ::structmap::FieldType::of::<#ty>())
        };
        if let Some(alias) = &field.attrs.alias {
            descriptor = quote! { #descriptor.with_alias(#alias) };
        }
        if field.attrs.readonly {
            descriptor = quote! { #descriptor.readonly() };
        }
        descriptor
    });

    quote! {
        impl ::structmap::Field for #name {
            fn kind() -> ::structmap::Kind {
                ::structmap::Kind::Record
            }

            fn fresh() -> ::core::option::Option<Self> {
                ::core::option::Option::Some(<Self as ::core::default::Default>::default())
            }

            fn is_zero(&self) -> bool {
                true #(&& ::structmap::Field::is_zero(&self.#members))*
            }

            fn assign_from(&mut self, source: &dyn ::structmap::Field) -> bool {
                ::structmap::__private::assign_clone(self, source)
            }

            fn as_record(&self) -> ::core::option::Option<&dyn ::structmap::Record> {
                ::core::option::Option::Some(self)
            }

            fn install_record(&mut self) -> ::core::option::Option<&mut dyn ::structmap::Record> {
                ::core::option::Option::Some(self)
            }
        }

        impl ::structmap::Record for #name {
            fn shape(&self) -> &'static ::structmap::Shape {
                static SHAPE: ::structmap::Shape = ::structmap::Shape::of::<#name>(
                    #name_str,
                    &[#(#descriptors),*],
                );
                &SHAPE
            }

            fn field(&self, index: usize) -> ::core::option::Option<&dyn ::structmap::Field> {
                match index {
                    #(#indices => ::core::option::Option::Some(&self.#members as &dyn ::structmap::Field),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_mut(&mut self, index: usize) -> ::core::option::Option<&mut dyn ::structmap::Field> {
                match index {
                    #(#indices => ::core::option::Option::Some(&mut self.#members as &mut dyn ::structmap::Field),)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    }
}
