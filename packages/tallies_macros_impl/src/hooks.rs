use proc_macro2::{Ident, TokenStream};
use quote::quote;
use syn::{Attribute, Path, parse_quote};

use crate::compiled::{BaseEntry, CompiledSchema};
use crate::{MetricKind, Naming, Overrides, Result};

/// Whether generated hooks update statistics.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Instrumentation {
    /// Hooks update the calling thread's record.
    Enabled,

    /// Hooks compile to nothing unless overridden.
    Disabled,

    /// Both variants are emitted, selected by `#[cfg(feature = "...")]` in the crate that
    /// compiles the generated code.
    Feature(String),
}

/// The names the hook emitters refer to.
pub(crate) struct HookContext<'a> {
    pub(crate) naming: &'a Naming,
    pub(crate) record: &'a Ident,
    pub(crate) aggregator: &'a Ident,
    pub(crate) overrides: &'a Overrides,
}

/// Emits one hook per base metric plus the `publish`, `clear` and `dump` hooks.
pub(crate) fn emit_hooks(
    compiled: &CompiledSchema,
    context: &HookContext<'_>,
    instrumentation: &Instrumentation,
) -> Result<TokenStream> {
    let mut hooks = Vec::with_capacity(compiled.storage.len().saturating_add(3));

    for entry in &compiled.storage {
        let name = context.naming.hook_ident(&entry.name)?;
        hooks.push(select(instrumentation, |enabled| {
            metric_hook(entry, &name, context, enabled)
        }));
    }

    for lifecycle in ["publish", "clear", "dump"] {
        let name = context.naming.hook_ident(lifecycle)?;
        hooks.push(select(instrumentation, |enabled| {
            lifecycle_hook(lifecycle, &name, context, enabled)
        }));
    }

    Ok(quote!(#(#hooks)*))
}

/// Emits the enabled or disabled variant of a hook, or both behind a cargo feature.
fn select(instrumentation: &Instrumentation, emit: impl Fn(bool) -> TokenStream) -> TokenStream {
    match instrumentation {
        Instrumentation::Enabled => emit(true),
        Instrumentation::Disabled => emit(false),
        Instrumentation::Feature(feature) => {
            let on: Attribute = parse_quote!(#[cfg(feature = #feature)]);
            let off: Attribute = parse_quote!(#[cfg(not(feature = #feature))]);
            let enabled = emit(true);
            let disabled = emit(false);

            quote! {
                #on
                #enabled
                #off
                #disabled
            }
        }
    }
}

fn metric_hook(
    entry: &BaseEntry,
    name: &Ident,
    context: &HookContext<'_>,
    enabled: bool,
) -> TokenStream {
    let record = context.record;
    let mutator = &entry.mutator;
    let runtime = &context.naming.runtime;
    let override_target = context.overrides.get(&entry.name);

    match entry.kind {
        MetricKind::Counter => {
            let doc = format!("Counts one `{}` event on the current thread.", entry.name);

            let body = if enabled {
                quote!(#record::with_current(#record::#mutator);)
            } else if let Some(target) = override_target {
                quote!(#target();)
            } else {
                return quote! {
                    #[doc = #doc]
                    #[allow(dead_code, reason = "not every host calls every hook")]
                    #[inline(always)]
                    pub fn #name() {}
                };
            };

            quote! {
                #[doc = #doc]
                #[allow(dead_code, reason = "not every host calls every hook")]
                #[inline]
                pub fn #name() {
                    #body
                }
            }
        }
        MetricKind::Sum | MetricKind::Max => {
            let doc = if entry.kind == MetricKind::Sum {
                format!("Adds `amount` to `{}` on the current thread.", entry.name)
            } else {
                format!(
                    "Raises `{}` on the current thread to `amount` if it is larger.",
                    entry.name
                )
            };

            let body = if enabled {
                quote!(#record::with_current(|record| record.#mutator(amount));)
            } else if let Some(target) = override_target {
                quote!(#target(#runtime::__private::AsPrimitive::<u64>::as_(amount));)
            } else {
                return quote! {
                    #[doc = #doc]
                    #[allow(dead_code, reason = "not every host calls every hook")]
                    #[inline(always)]
                    pub fn #name(_amount: impl #runtime::__private::AsPrimitive<u64>) {}
                };
            };

            quote! {
                #[doc = #doc]
                #[allow(dead_code, reason = "not every host calls every hook")]
                #[inline]
                pub fn #name(amount: impl #runtime::__private::AsPrimitive<u64>) {
                    #body
                }
            }
        }
    }
}

fn lifecycle_hook(
    lifecycle: &str,
    name: &Ident,
    context: &HookContext<'_>,
    enabled: bool,
) -> TokenStream {
    let record = context.record;
    let aggregator = context.aggregator;
    let override_target = context.overrides.get(lifecycle);

    let (doc, receiver, enabled_body): (&str, TokenStream, TokenStream) = match lifecycle {
        "publish" => (
            "Moves the current thread's record into `aggregator` and starts a fresh one.",
            quote!(&mut #aggregator),
            quote!(aggregator.publish(#record::take_current());),
        ),
        "clear" => (
            "Removes every record published to `aggregator`.",
            quote!(&mut #aggregator),
            quote!(aggregator.clear();),
        ),
        _ => (
            "Prints the report of `aggregator` to standard output.",
            quote!(&#aggregator),
            quote!(::std::print!("{aggregator}");),
        ),
    };

    // A dump override replaces the body in every mode; the others only fill in for
    // disabled hooks.
    let delegate = |target: &Path| quote!(#target(aggregator););

    let body = match override_target {
        Some(target) if lifecycle == "dump" => delegate(target),
        _ if enabled => enabled_body,
        Some(target) => delegate(target),
        None => {
            return quote! {
                #[doc = #doc]
                #[allow(dead_code, reason = "not every host calls every hook")]
                #[inline(always)]
                pub fn #name(_aggregator: #receiver) {}
            };
        }
    };

    quote! {
        #[doc = #doc]
        #[allow(dead_code, reason = "not every host calls every hook")]
        #[inline]
        pub fn #name(aggregator: #receiver) {
            #body
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use proc_macro2::Span;

    use super::*;
    use crate::{Schema, compile};

    fn emit(overrides: &Overrides, instrumentation: &Instrumentation) -> String {
        let compiled = compile(
            &Schema::builder()
                .counter("failures")
                .sum("reads")
                .max("max write size")
                .build(),
        )
        .unwrap();

        let naming = Naming::default().hook_prefix("log_");
        let record = Ident::new("Record", Span::call_site());
        let aggregator = Ident::new("Stats", Span::call_site());

        let context = HookContext {
            naming: &naming,
            record: &record,
            aggregator: &aggregator,
            overrides,
        };

        emit_hooks(&compiled, &context, instrumentation)
            .unwrap()
            .to_string()
    }

    #[test]
    fn enabled_hooks_write_current_record() {
        let emitted = emit(&Overrides::new(), &Instrumentation::Enabled);

        assert!(
            emitted.contains(&quote!(Record::with_current(Record::count_failures);).to_string()),
            "{emitted}"
        );
        assert!(
            emitted.contains(
                &quote!(Record::with_current(|record| record.add_reads(amount));).to_string()
            ),
            "{emitted}"
        );
        assert!(
            emitted.contains(&quote!(aggregator.publish(Record::take_current());).to_string()),
            "{emitted}"
        );
        assert!(emitted.contains("pub fn log_max_write_size"), "{emitted}");
        assert!(!emitted.contains("inline (always)"), "{emitted}");
    }

    #[test]
    fn disabled_hooks_are_empty() {
        let emitted = emit(&Overrides::new(), &Instrumentation::Disabled);

        assert!(emitted.contains(&quote!(pub fn log_failures() {}).to_string()), "{emitted}");
        assert!(
            emitted.contains(&quote!(pub fn log_clear(_aggregator: &mut Stats) {}).to_string()),
            "{emitted}"
        );
        assert!(!emitted.contains("with_current"), "{emitted}");
        assert!(!emitted.contains(":: std :: print"), "{emitted}");
    }

    #[test]
    fn overrides_only_replace_disabled_bodies() {
        let overrides = Overrides::new()
            .with("failures", parse_quote!(crate::on_failure))
            .with("reads", parse_quote!(crate::on_reads));

        let disabled = emit(&overrides, &Instrumentation::Disabled);
        assert!(disabled.contains(&quote!(crate::on_failure();).to_string()), "{disabled}");
        assert!(
            disabled.contains(
                &quote!(crate::on_reads(::tallies::__private::AsPrimitive::<u64>::as_(amount));)
                    .to_string()
            ),
            "{disabled}"
        );

        let enabled = emit(&overrides, &Instrumentation::Enabled);
        assert!(!enabled.contains("on_failure"), "{enabled}");
        assert!(!enabled.contains("on_reads"), "{enabled}");
    }

    #[test]
    fn dump_override_applies_in_every_mode() {
        let overrides = Overrides::new().with("dump", parse_quote!(crate::report));

        for instrumentation in [Instrumentation::Enabled, Instrumentation::Disabled] {
            let emitted = emit(&overrides, &instrumentation);

            assert!(
                emitted.contains(&quote!(crate::report(aggregator);).to_string()),
                "{emitted}"
            );
            assert!(!emitted.contains(":: std :: print"), "{emitted}");
        }
    }

    #[test]
    fn feature_mode_emits_both_variants() {
        let emitted = emit(
            &Overrides::new(),
            &Instrumentation::Feature("stats".to_string()),
        );

        assert!(
            emitted.contains(&quote!(#[cfg(feature = "stats")]).to_string()),
            "{emitted}"
        );
        assert!(
            emitted.contains(&quote!(#[cfg(not(feature = "stats"))]).to_string()),
            "{emitted}"
        );
        assert_eq!(emitted.matches("pub fn log_failures").count(), 2);
        assert_eq!(emitted.matches("pub fn log_dump").count(), 2);
    }
}
