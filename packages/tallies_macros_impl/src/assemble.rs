use proc_macro2::TokenStream;
use quote::quote;
use tracing::debug;

use crate::aggregator::emit_aggregator;
use crate::hooks::{HookContext, emit_hooks};
use crate::record::emit_record;
use crate::report::{emit_aggregator_report, emit_record_report};
use crate::{Instrumentation, Naming, Overrides, Result, Schema, SchemaError, compile};

/// Compiles a schema and emits the complete statistics artifact: record type, aggregator
/// type, their reports and the hook functions.
///
/// Everything is validated before anything is emitted, so on error there is no partial
/// output. Identical inputs always produce identical output.
///
/// # Errors
///
/// Any [`SchemaError`] from [`compile()`], plus:
///
/// * [`SchemaError::InvalidName`] if a configured type, module or hook name is not a Rust
///   identifier.
/// * [`SchemaError::DuplicateName`] if the record and aggregator share a name or a hook is
///   overridden twice.
/// * [`SchemaError::InvalidOverride`] if an override targets a hook that does not exist.
pub fn generate(
    schema: &Schema,
    naming: &Naming,
    instrumentation: &Instrumentation,
    overrides: &Overrides,
) -> Result<TokenStream> {
    let compiled = compile(schema)?;
    overrides.validate(&compiled)?;

    let record = naming.record_ident()?;
    let aggregator = naming.aggregator_ident()?;
    let thread_local = naming.thread_local_ident()?;
    let module = naming.module_ident()?;

    if record == aggregator {
        return Err(SchemaError::duplicate(record.to_string(), "type names"));
    }

    let runtime = &naming.runtime;

    let hooks = emit_hooks(
        &compiled,
        &HookContext {
            naming,
            record: &record,
            aggregator: &aggregator,
            overrides,
        },
        instrumentation,
    )?;

    let record_type = emit_record(&compiled, &record, &thread_local, runtime);
    let record_report = emit_record_report(&compiled, &record);
    let aggregator_type = emit_aggregator(&compiled, &aggregator, &record, runtime);
    let aggregator_report = emit_aggregator_report(&compiled, &aggregator, runtime);

    debug!(
        record = %record,
        aggregator = %aggregator,
        metrics = compiled.display_order().count(),
        ?instrumentation,
        "generated statistics artifact"
    );

    let items = quote! {
        #record_type
        #record_report
        #aggregator_type
        #aggregator_report
        #hooks
    };

    Ok(match module {
        Some(module) => {
            let doc = format!("Statistics hooks and reports for `{aggregator}`.");

            quote! {
                #[doc = #doc]
                pub mod #module {
                    #items
                }
            }
        }
        None => items,
    })
}
