//! Derive macro for `confschema_core::ConfigDefinition`.
//!
//! Field metadata is declared with `#[config(...)]`:
//!
//! ```ignore
//! #[derive(ConfigDefinition)]
//! struct DeviceConfig {
//!     #[config(embed)]
//!     base: BaseDeviceConfig,
//!     #[config(validate = "port", order = 6, default = "80")]
//!     port: u16,
//!     #[config(options = "fast,slow", label = "Mode")]
//!     mode: String,
//! }
//! ```
//!
//! Only attribute syntax is checked here. Whether a `validate` rule fits the
//! field type is decided by the schema builder at runtime.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{Attribute, Data, DeriveInput, Expr, ExprLit, ExprUnary, Fields, Lit, LitStr, UnOp};

/// `#[config(key = "...")]` keys and the `TagKey` variants they map to.
const TAG_KEYS: [(&str, &str); 12] = [
    ("validate", "Validate"),
    ("description", "Description"),
    ("options", "Options"),
    ("dispatch", "Dispatch"),
    ("order", "Order"),
    ("default", "Default"),
    ("label", "Label"),
    ("headline", "Headline"),
    ("required", "Required"),
    ("hidden", "Hidden"),
    ("only_on_model", "OnlyOnModel"),
    ("not_on_model", "NotOnModel"),
];

/// Derive `confschema_core::ConfigDefinition` and `confschema_core::ConfigField`.
#[proc_macro_derive(ConfigDefinition, attributes(config))]
pub fn derive_config_definition(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand_config_definition(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_config_definition(input: &DeriveInput) -> Result<proc_macro2::TokenStream, syn::Error> {
    let container = parse_container_attrs(&input.attrs)?;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "ConfigDefinition cannot be derived for generic structs",
        ));
    }
    let Data::Struct(struct_data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "ConfigDefinition can only be derived for structs",
        ));
    };

    let fields = match &struct_data.fields {
        Fields::Named(fields) => &fields.named,
        _ => {
            return Err(syn::Error::new_spanned(
                &struct_data.fields,
                "ConfigDefinition requires named fields",
            ));
        },
    };

    let name = &input.ident;
    let type_name = name.to_string();
    let mut field_defs = Vec::new();
    let mut embed_impls = Vec::new();
    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let attrs = parse_field_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }

        let key = attrs.rename.unwrap_or_else(|| ident.unraw().to_string());
        let ty = &field.ty;
        let constructor = if attrs.embed {
            format_ident!("embedded")
        } else {
            format_ident!("new")
        };
        let tags = attrs.tags.iter().map(|(variant, value)| {
            let variant = format_ident!("{}", variant);
            quote! { .tag(::confschema_core::TagKey::#variant, #value) }
        });
        field_defs.push(quote! {
            .field(
                ::confschema_core::FieldDefinition::#constructor(
                    #key,
                    <#ty as ::confschema_core::ConfigField>::shape(),
                )
                #(#tags)*
            )
        });

        if attrs.embed {
            embed_impls.push(quote! {
                impl ::confschema_core::Embedded<#ty> for #name {
                    fn embedded(&self) -> &#ty {
                        &self.#ident
                    }
                }
            });
        }
    }

    let (device_capability, device_assertion) = if container.device {
        (
            quote! { .with_device_capability() },
            quote! {
                const _: fn() = || {
                    fn assert_device_identity<T: ?Sized + ::confschema_core::DeviceIdentity>() {}
                    assert_device_identity::<#name>();
                };
            },
        )
    } else {
        (quote! {}, quote! {})
    };

    Ok(quote! {
        impl ::confschema_core::ConfigDefinition for #name {
            fn definition() -> ::confschema_core::StructDefinition {
                ::confschema_core::StructDefinition::new(#type_name)
                    #(#field_defs)*
                    #device_capability
            }
        }

        impl ::confschema_core::ConfigField for #name {
            fn shape() -> ::confschema_core::FieldShape {
                ::confschema_core::FieldShape::Struct(
                    <Self as ::confschema_core::ConfigDefinition>::definition(),
                )
            }
        }

        #(#embed_impls)*

        #device_assertion
    })
}

#[derive(Debug, Default)]
struct ContainerAttrs {
    device: bool,
}

fn parse_container_attrs(attrs: &[Attribute]) -> Result<ContainerAttrs, syn::Error> {
    let mut container = ContainerAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("config") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("device") {
                if container.device {
                    return Err(meta.error("duplicate config(device)"));
                }
                container.device = true;
                return Ok(());
            }
            Err(meta.error("unsupported config attribute on container"))
        })?;
    }
    Ok(container)
}

#[derive(Debug, Default)]
struct FieldAttrs {
    tags: Vec<(&'static str, LitStr)>,
    rename: Option<String>,
    embed: bool,
    skip: bool,
}

fn parse_field_attrs(attrs: &[Attribute]) -> Result<FieldAttrs, syn::Error> {
    let mut parsed = FieldAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("config") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("embed") {
                parsed.embed = true;
                return Ok(());
            }
            if meta.path.is_ident("skip") {
                parsed.skip = true;
                return Ok(());
            }
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                if parsed.rename.is_some() {
                    return Err(meta.error("duplicate config(rename = ...)"));
                }
                parsed.rename = Some(value.value());
                return Ok(());
            }

            let Some((key, variant)) = TAG_KEYS
                .iter()
                .find(|(key, _)| meta.path.is_ident(key))
                .copied()
            else {
                return Err(meta.error("unsupported config attribute on field"));
            };
            if parsed.tags.iter().any(|(existing, _)| *existing == variant) {
                return Err(meta.error(format!("duplicate config({key} = ...)")));
            }
            let expr: Expr = meta.value()?.parse()?;
            parsed.tags.push((variant, tag_value(&expr, key)?));
            Ok(())
        })?;
    }
    Ok(parsed)
}

/// String value of a tag. `order` also takes integer literals, negative ones included.
fn tag_value(expr: &Expr, key: &str) -> Result<LitStr, syn::Error> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(value),
            ..
        }) => Ok(value.clone()),
        Expr::Lit(ExprLit {
            lit: Lit::Int(value),
            ..
        }) if key == "order" => Ok(LitStr::new(value.base10_digits(), value.span())),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr: inner,
            ..
        }) if key == "order" => match inner.as_ref() {
            Expr::Lit(ExprLit {
                lit: Lit::Int(value),
                ..
            }) => Ok(LitStr::new(
                &format!("-{}", value.base10_digits()),
                value.span(),
            )),
            _ => Err(syn::Error::new_spanned(
                expr,
                "config(order) expects an integer or string literal",
            )),
        },
        _ => Err(syn::Error::new_spanned(
            expr,
            format!("config({key}) expects a string literal"),
        )),
    }
}
