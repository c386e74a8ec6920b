use std::fmt::Write;

use proc_macro2::TokenStream;
use quote::ToTokens;
use syn::{File, Item, ItemMod};

use crate::Result;

/// Turns generated tokens into source text with one top-level item per line.
///
/// Items of a wrapping module are also placed on their own lines. The result is valid but
/// dense Rust; run `rustfmt` over it for a conventional layout.
pub(crate) fn render(tokens: TokenStream, origin: &str) -> Result<String> {
    let file = syn::parse2::<File>(tokens)?;

    let mut output = String::new();
    writeln!(
        output,
        "// @generated by tallies_gen from {origin}. Do not edit by hand.\n"
    )
    .expect("we expect writing to a String to be infallible");

    for item in &file.items {
        render_item(item, &mut output);
    }

    Ok(output)
}

fn render_item(item: &Item, output: &mut String) {
    if let Item::Mod(ItemMod {
        attrs,
        vis,
        ident,
        content: Some((_, items)),
        ..
    }) = item
    {
        for attr in attrs {
            writeln!(output, "{}", attr.to_token_stream())
                .expect("we expect writing to a String to be infallible");
        }

        writeln!(output, "{} mod {ident} {{", vis.to_token_stream())
            .expect("we expect writing to a String to be infallible");

        for inner in items {
            render_item(inner, output);
        }

        writeln!(output, "}}").expect("we expect writing to a String to be infallible");
    } else {
        writeln!(output, "{}\n", item.to_token_stream())
            .expect("we expect writing to a String to be infallible");
    }
}
