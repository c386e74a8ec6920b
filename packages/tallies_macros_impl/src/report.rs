use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use syn::LitStr;

use crate::compiled::CompiledSchema;
use crate::naming::pretty_name;

/// Record report lines are indented so they read as nested under the thread header.
const RECORD_INDENT: &str = "    ";

/// The labels of a report in display order, each padded so that every value starts in the
/// same column: longest label (including the colon) plus one space.
pub(crate) fn padded_labels(compiled: &CompiledSchema) -> Vec<String> {
    let labels = compiled
        .display_order()
        .map(|name| format!("{}:", pretty_name(name)))
        .collect::<Vec<_>>();

    let width = labels
        .iter()
        .map(|label| label.chars().count())
        .max()
        .unwrap_or_default()
        .saturating_add(1);

    labels
        .into_iter()
        .map(|label| format!("{label:<width$}"))
        .collect()
}

/// One `writeln!` per metric, reading every value through its accessor on `self`.
fn report_lines(compiled: &CompiledSchema, indent: &str) -> Vec<TokenStream> {
    compiled
        .display_order()
        .zip(padded_labels(compiled))
        .map(|(name, label)| {
            let accessor = compiled.metric(name).ident();
            let format = LitStr::new(&format!("{indent}{label}{{}}"), Span::call_site());

            quote! {
                ::core::writeln!(f, #format, self.#accessor())?;
            }
        })
        .collect()
}

/// `Display` for the record: its own values, one indented line per metric.
pub(crate) fn emit_record_report(compiled: &CompiledSchema, record: &Ident) -> TokenStream {
    let lines = report_lines(compiled, RECORD_INDENT);

    quote! {
        impl ::core::fmt::Display for #record {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                #(#lines)*
                ::core::result::Result::Ok(())
            }
        }
    }
}

/// Summary rendering for the aggregator plus its `Display`, which appends one sub-report
/// per ledger entry after the summary.
pub(crate) fn emit_aggregator_report(
    compiled: &CompiledSchema,
    aggregator: &Ident,
    runtime: &syn::Path,
) -> TokenStream {
    let lines = report_lines(compiled, "");

    quote! {
        impl #aggregator {
            /// Writes one line per metric with the values reduced over the whole ledger.
            pub fn write_summary(&self, f: &mut impl ::core::fmt::Write) -> ::core::fmt::Result {
                #(#lines)*
                ::core::result::Result::Ok(())
            }

            /// Renders the summary, optionally followed by one sub-report per published record.
            #[must_use]
            pub fn results(&self, per_record: bool) -> ::std::string::String {
                let mut output = ::std::string::String::new();

                self.write_summary(&mut output)
                    .expect("we expect writing to a String to be infallible");

                if per_record {
                    #runtime::Ledger::write_entries(&self.ledger, &mut output)
                        .expect("we expect writing to a String to be infallible");
                }

                output
            }
        }

        impl ::core::fmt::Display for #aggregator {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                self.write_summary(f)?;
                #runtime::Ledger::write_entries(&self.ledger, f)
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{Schema, compile};

    #[test]
    fn labels_share_one_width() {
        let schema = Schema::builder().sum("reads").max("max write size").build();
        let compiled = compile(&schema).unwrap();

        let labels = padded_labels(&compiled);

        assert_eq!(labels, ["Reads:          ", "Max Write Size: "]);
        assert!(labels.iter().all(|label| label.len() == "Max Write Size:".len() + 1));
    }

    #[test]
    fn labels_follow_display_order() {
        let schema = Schema::builder()
            .counter("a")
            .counter("bb")
            .display_order(["bb"])
            .build();
        let compiled = compile(&schema).unwrap();

        assert_eq!(padded_labels(&compiled), ["Bb: ", "A:  "]);
    }

    #[test]
    fn empty_schema_has_no_labels() {
        let compiled = compile(&Schema::default()).unwrap();

        assert!(padded_labels(&compiled).is_empty());
    }

    #[test]
    fn record_lines_are_indented() {
        let schema = Schema::builder().sum("reads").build();
        let compiled = compile(&schema).unwrap();
        let record = Ident::new("Record", Span::call_site());

        let emitted = emit_record_report(&compiled, &record).to_string();

        assert!(emitted.contains("\"    Reads: {}\""), "{emitted}");
    }
}
