use heck::ToUpperCamelCase;
use proc_macro_error2::abort;
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Data, DeriveInput, spanned::Spanned};

/// Tenant decision parsed from `#[tenant(...)]`.
#[derive(Debug, PartialEq, Eq)]
enum TenantDecision {
    Column(String),
    NoTenant,
    TenantTable,
}

pub fn expand_derive_tenant_bound(input: &DeriveInput) -> TokenStream {
    if !matches!(&input.data, Data::Struct(_)) {
        abort!(
            input.span(),
            "#[derive(TenantBound)] can only be applied to structs"
        );
    }

    let decision = match parse_tenant_attrs(input) {
        Ok(decision) => decision,
        Err(err) => abort!(err.span(), "{}", err),
    };

    generate_impl(&decision, input.ident.span())
}

fn generate_impl(decision: &TenantDecision, span: Span) -> TokenStream {
    let entity_ident = syn::Ident::new("Entity", span);

    let is_tenant_table = matches!(decision, TenantDecision::TenantTable);
    let tenant_col_body = match decision {
        TenantDecision::Column(col) => {
            let col_ident = syn::Ident::new(&col.to_upper_camel_case(), span);
            quote! { ::core::option::Option::Some(Column::#col_ident) }
        }
        TenantDecision::NoTenant | TenantDecision::TenantTable => {
            quote! { ::core::option::Option::None }
        }
    };

    quote! {
        impl ::tenant_db::secure::TenantBound for #entity_ident {
            const IS_TENANT_TABLE: bool = #is_tenant_table;

            fn tenant_col() -> ::core::option::Option<Self::Column> {
                #tenant_col_body
            }
        }
    }
}

/// Parse all `#[tenant(...)]` attributes; exactly one decision is allowed.
fn parse_tenant_attrs(input: &DeriveInput) -> syn::Result<TenantDecision> {
    let mut decision: Option<TenantDecision> = None;

    for attr in &input.attrs {
        if !attr.path().is_ident("tenant") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            let parsed = if meta.path.is_ident("no_tenant") {
                TenantDecision::NoTenant
            } else if meta.path.is_ident("tenant_table") {
                TenantDecision::TenantTable
            } else if meta.path.is_ident("tenant_col") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                let col = lit.value();
                if col.is_empty() {
                    return Err(meta.error("tenant_col must not be empty"));
                }
                TenantDecision::Column(col)
            } else {
                return Err(meta.error(
                    "unknown attribute; valid attributes: tenant_col, no_tenant, tenant_table",
                ));
            };

            if decision.is_some() {
                return Err(meta.error(
                    "tenant: specify exactly one of `tenant_col`, `no_tenant`, `tenant_table`",
                ));
            }
            decision = Some(parsed);
            Ok(())
        })?;
    }

    decision.ok_or_else(|| {
        syn::Error::new(
            input.ident.span(),
            "tenant: missing explicit decision:\n  \
             use `tenant_col = \"column_name\"`, `no_tenant` or `tenant_table`",
        )
    })
}
