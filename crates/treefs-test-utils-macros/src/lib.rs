// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! `#[logged_test]`: wraps a test in a `treefs_test_utils::TestLoggerGuard`.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, ItemFn, ReturnType, Type};

/// Marks a synchronous test whose body gets a `logger: &mut TestLogger`.
///
/// ```ignore
/// #[treefs_test_utils::logged_test]
/// fn creates_a_file() {
///     logger.log("creating /a").unwrap();
/// }
/// ```
///
/// Tests returning `Result` have an `Err` recorded as a failure in their log.
#[proc_macro_attribute]
pub fn logged_test(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return syn::Error::new(Span::call_site(), "#[logged_test] does not accept arguments")
            .to_compile_error()
            .into();
    }

    let mut input = parse_macro_input!(item as ItemFn);

    if let Some(async_token) = &input.sig.asyncness {
        return syn::Error::new(async_token.span(), "#[logged_test] cannot be applied to async functions")
            .to_compile_error()
            .into();
    }
    if !input.sig.inputs.is_empty() {
        return syn::Error::new(
            input.sig.ident.span(),
            "#[logged_test] can only be applied to functions without parameters",
        )
        .to_compile_error()
        .into();
    }

    input.attrs.retain(|attr| !attr.path().is_ident("logged_test"));

    let fn_ident = &input.sig.ident;
    let fn_name = fn_ident.to_string();
    let visibility = &input.vis;
    let output = &input.sig.output;
    let block = &input.block;
    let other_attrs = &input.attrs;
    let finish = finish_body(output);

    quote! {
        #[::core::prelude::v1::test]
        #(#other_attrs)*
        #visibility fn #fn_ident () #output {
            let mut __guard = ::treefs_test_utils::TestLoggerGuard::new(#fn_name)
                .expect("failed to create test logger");
            let logger = __guard.logger();
            let _ = &logger;

            let __result = #block;
            #finish
        }
    }
    .into()
}

fn returns_result(output: &ReturnType) -> bool {
    match output {
        ReturnType::Type(_, ty) => match ty.as_ref() {
            Type::Path(path) => path.path.segments.last().is_some_and(|seg| seg.ident == "Result"),
            _ => false,
        },
        ReturnType::Default => false,
    }
}

fn finish_body(output: &ReturnType) -> TokenStream2 {
    if returns_result(output) {
        quote! {
            match __result {
                ::std::result::Result::Ok(value) => {
                    if let Err(e) = __guard.finish_success() {
                        panic!("failed to finalize test logger: {}", e);
                    }
                    ::std::result::Result::Ok(value)
                }
                ::std::result::Result::Err(err) => {
                    let reason = format!("{:?}", err);
                    if let Err(e) = __guard.finish_failure(&reason) {
                        eprintln!("failed to finalize test logger: {}", e);
                    }
                    ::std::result::Result::Err(err)
                }
            }
        }
    } else {
        quote! {
            if let Err(e) = __guard.finish_success() {
                panic!("failed to finalize test logger: {}", e);
            }
            __result
        }
    }
}
