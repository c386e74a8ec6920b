use proc_macro2::{Ident, TokenStream};
use quote::quote;

use crate::MetricKind;
use crate::compiled::{BaseEntry, CompiledSchema};
use crate::expression::{compound_expression, value_type_tokens};

/// Emits the per-thread record type, its accessors and mutators, and the thread-local
/// instance that hooks write to.
pub(crate) fn emit_record(
    compiled: &CompiledSchema,
    record: &Ident,
    thread_local: &Ident,
    runtime: &syn::Path,
) -> TokenStream {
    let fields = compiled.storage.iter().map(|entry| &entry.ident).collect::<Vec<_>>();

    let getters = compiled.storage.iter().map(|entry| {
        let ident = &entry.ident;
        let doc = format!("The `{}` value of this record.", entry.name);

        quote! {
            #[doc = #doc]
            #[must_use]
            pub const fn #ident(&self) -> u64 {
                self.#ident
            }
        }
    });

    let mutators = compiled
        .storage
        .iter()
        .map(|entry| emit_mutator(entry, runtime));

    let compounds = compiled.derivation.iter().map(|entry| {
        let ident = &entry.ident;
        let value_type = value_type_tokens(entry.value_type);
        let expression = compound_expression(entry, compiled);
        let doc = format!("The `{}` value derived from this record.", entry.name);

        quote! {
            #[doc = #doc]
            #[must_use]
            pub fn #ident(&self) -> #value_type {
                #expression
            }
        }
    });

    quote! {
        /// Statistics collected by one thread. Hooks write to the calling thread's instance
        /// and `take_current()` moves it out for publishing.
        #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
        pub struct #record {
            #(#fields: u64,)*
        }

        #[allow(
            dead_code,
            clippy::arithmetic_side_effects,
            clippy::cast_precision_loss,
            clippy::float_arithmetic,
            clippy::integer_division,
            reason = "generated statistics code; not every host calls every item"
        )]
        impl #record {
            /// Creates a record with every metric at zero.
            #[must_use]
            pub const fn new() -> Self {
                Self {
                    #(#fields: 0,)*
                }
            }

            #(#getters)*

            #(#mutators)*

            #(#compounds)*

            /// Runs `f` with exclusive access to the current thread's record.
            pub fn with_current<R>(f: impl ::core::ops::FnOnce(&mut Self) -> R) -> R {
                #thread_local.with_borrow_mut(f)
            }

            /// Moves the current thread's record out, leaving a zeroed record behind.
            #[must_use]
            pub fn take_current() -> Self {
                #thread_local.with_borrow_mut(::core::mem::take)
            }
        }

        ::std::thread_local! {
            static #thread_local: ::core::cell::RefCell<#record> =
                const { ::core::cell::RefCell::new(#record::new()) };
        }
    }
}

fn emit_mutator(entry: &BaseEntry, runtime: &syn::Path) -> TokenStream {
    let ident = &entry.ident;
    let mutator = &entry.mutator;
    let name = &entry.name;

    match entry.kind {
        MetricKind::Counter => {
            let doc = format!("Counts one `{name}` event.");

            quote! {
                #[doc = #doc]
                pub fn #mutator(&mut self) {
                    self.#ident = self.#ident.wrapping_add(1);
                }
            }
        }
        MetricKind::Sum => {
            let doc = format!("Adds `amount` to `{name}`.");

            quote! {
                #[doc = #doc]
                pub fn #mutator(&mut self, amount: impl #runtime::__private::AsPrimitive<u64>) {
                    let amount = #runtime::__private::AsPrimitive::<u64>::as_(amount);
                    self.#ident = self.#ident.wrapping_add(amount);
                }
            }
        }
        MetricKind::Max => {
            let doc = format!("Raises `{name}` to `value` if `value` is larger.");

            quote! {
                #[doc = #doc]
                pub fn #mutator(&mut self, value: impl #runtime::__private::AsPrimitive<u64>) {
                    let value = #runtime::__private::AsPrimitive::<u64>::as_(value);
                    self.#ident = ::core::cmp::max(self.#ident, value);
                }
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use proc_macro2::Span;
    use syn::parse_quote;

    use super::*;
    use crate::{Operator, Schema, compile};

    fn emit(schema: &Schema) -> String {
        let compiled = compile(schema).unwrap();

        emit_record(
            &compiled,
            &Ident::new("Record", Span::call_site()),
            &Ident::new("RECORD_INSTANCE", Span::call_site()),
            &parse_quote!(::tallies),
        )
        .to_string()
    }

    #[test]
    fn fields_follow_storage_order() {
        let schema = Schema::builder()
            .counter("failures")
            .sum("reads")
            .storage_order(["reads"])
            .build();

        let emitted = emit(&schema);

        assert!(
            emitted.contains(&quote!(pub struct Record { reads: u64, failures: u64, }).to_string()),
            "{emitted}"
        );
    }

    #[test]
    fn mutators_match_metric_kinds() {
        let schema = Schema::builder()
            .counter("failures")
            .sum("reads")
            .max("max write size")
            .build();

        let emitted = emit(&schema);

        assert!(emitted.contains("fn count_failures (& mut self)"), "{emitted}");
        assert!(emitted.contains("fn add_reads (& mut self , amount"), "{emitted}");
        assert!(
            emitted.contains("fn observe_max_write_size (& mut self , value"),
            "{emitted}"
        );
        assert!(emitted.contains("wrapping_add (1)"), "{emitted}");
        assert!(emitted.contains(":: core :: cmp :: max"), "{emitted}");
    }

    #[test]
    fn compound_accessors_carry_value_type() {
        let schema = Schema::builder()
            .counter("failures")
            .counter("successes")
            .compound("transactions", Operator::Add, ["failures", "successes"])
            .compound("success rate", Operator::Divide, ["successes", "transactions"])
            .build();

        let emitted = emit(&schema);

        assert!(emitted.contains("fn transactions (& self) -> u64"), "{emitted}");
        assert!(emitted.contains("fn success_rate (& self) -> f64"), "{emitted}");
    }

    #[test]
    fn thread_local_instance_is_declared() {
        let emitted = emit(&Schema::builder().counter("reads").build());

        assert!(emitted.contains("static RECORD_INSTANCE"), "{emitted}");
        assert!(emitted.contains("fn take_current ()"), "{emitted}");
    }
}
