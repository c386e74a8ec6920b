use proc_macro2::{Ident, TokenStream};
use quote::quote;

use crate::MetricKind;
use crate::compiled::CompiledSchema;
use crate::expression::{compound_expression, value_type_tokens};

/// Emits the aggregator type: a ledger of published records plus one accessor per metric
/// that reduces over every entry in the ledger.
pub(crate) fn emit_aggregator(
    compiled: &CompiledSchema,
    aggregator: &Ident,
    record: &Ident,
    runtime: &syn::Path,
) -> TokenStream {
    let reductions = compiled.storage.iter().map(|entry| {
        let ident = &entry.ident;

        let (reduction, doc) = match entry.kind {
            MetricKind::Counter | MetricKind::Sum => (
                quote!(total),
                format!("The sum of `{}` over all published records.", entry.name),
            ),
            MetricKind::Max => (
                quote!(max),
                format!(
                    "The largest `{}` of any published record, or zero if there are none.",
                    entry.name
                ),
            ),
        };

        quote! {
            #[doc = #doc]
            #[must_use]
            pub fn #ident(&self) -> u64 {
                self.ledger.#reduction(#record::#ident)
            }
        }
    });

    let compounds = compiled.derivation.iter().map(|entry| {
        let ident = &entry.ident;
        let value_type = value_type_tokens(entry.value_type);
        let expression = compound_expression(entry, compiled);
        let doc = format!("The `{}` value derived from the aggregated totals.", entry.name);

        quote! {
            #[doc = #doc]
            #[must_use]
            pub fn #ident(&self) -> #value_type {
                #expression
            }
        }
    });

    let doc = format!(
        "Collects published [`{record}`] values. Totals and reports cover every record \
         published since creation or the last `clear()`."
    );

    quote! {
        #[doc = #doc]
        #[derive(Clone, Debug, Default)]
        pub struct #aggregator {
            ledger: #runtime::Ledger<#record>,
        }

        #[allow(
            dead_code,
            clippy::arithmetic_side_effects,
            clippy::cast_precision_loss,
            clippy::float_arithmetic,
            clippy::integer_division,
            reason = "generated statistics code; not every host calls every item"
        )]
        impl #aggregator {
            /// Creates an aggregator with an empty ledger.
            #[must_use]
            pub const fn new() -> Self {
                Self {
                    ledger: #runtime::Ledger::new(),
                }
            }

            /// Appends a record to the ledger.
            pub fn publish(&mut self, record: #record) {
                self.ledger.publish(record);
            }

            /// Removes every published record.
            pub fn clear(&mut self) {
                self.ledger.clear();
            }

            /// How many records have been published since creation or the last `clear()`.
            #[must_use]
            pub fn record_count(&self) -> usize {
                self.ledger.len()
            }

            /// The published records, in publication order.
            #[must_use]
            pub fn records(&self) -> &[#record] {
                self.ledger.as_slice()
            }

            #(#reductions)*

            #(#compounds)*
        }
    }
}
