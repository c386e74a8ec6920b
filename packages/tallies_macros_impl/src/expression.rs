use proc_macro2::TokenStream;
use quote::quote;

use crate::compiled::{CompiledSchema, CompoundEntry, ValueType};
use crate::Operator;

/// The Rust type of a value type.
pub(crate) fn value_type_tokens(value_type: ValueType) -> TokenStream {
    match value_type {
        ValueType::Integer => quote!(u64),
        ValueType::Float => quote!(f64),
    }
}

/// Emits the body of a compound accessor.
///
/// Operands are read through accessor calls on `self`, so the same expression serves the
/// record (over its own fields) and the aggregator (over its own reductions). Operands are
/// folded left to right. Whenever either side of a step is fractional the other side is
/// cast to `f64`; the last operand of a division is always cast. No other guard is emitted.
pub(crate) fn compound_expression(compound: &CompoundEntry, compiled: &CompiledSchema) -> TokenStream {
    let operator = operator_tokens(compound.operator);
    let last = compound.operands.len().saturating_sub(1);

    let mut operands = compound.operands.iter().enumerate();

    let (_, first) = operands
        .next()
        .expect("compound metrics have at least two operands");
    let first = compiled.metric(first);
    let first_ident = first.ident();

    let mut accumulated = quote!(self.#first_ident());
    let mut accumulated_type = first.value_type();
    let mut accumulated_is_single = true;

    for (i, operand) in operands {
        let operand = compiled.metric(operand);
        let operand_ident = operand.ident();

        let widen = compound.operator == Operator::Divide && i == last;
        let result_type = accumulated_type.combine(operand.value_type(), widen);

        if result_type == ValueType::Float && accumulated_type == ValueType::Integer {
            accumulated = if accumulated_is_single {
                quote!(#accumulated as f64)
            } else {
                quote!((#accumulated) as f64)
            };
        }

        let operand = if result_type == ValueType::Float && operand.value_type() == ValueType::Integer
        {
            quote!(self.#operand_ident() as f64)
        } else {
            quote!(self.#operand_ident())
        };

        accumulated = quote!(#accumulated #operator #operand);
        accumulated_type = result_type;
        accumulated_is_single = false;
    }

    debug_assert_eq!(
        accumulated_type, compound.value_type,
        "expression folding must agree with value type inference"
    );

    accumulated
}

fn operator_tokens(operator: Operator) -> TokenStream {
    match operator {
        Operator::Add => quote!(+),
        Operator::Subtract => quote!(-),
        Operator::Divide => quote!(/),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{Schema, compile};

    fn expression_of(schema: &Schema, name: &str) -> String {
        let compiled = compile(schema).unwrap();
        let compound = compiled
            .derivation
            .iter()
            .find(|entry| entry.name == name)
            .unwrap();

        compound_expression(compound, &compiled).to_string()
    }

    #[test]
    fn addition_stays_integral() {
        let schema = Schema::builder()
            .counter("failures")
            .counter("successes")
            .compound("transactions", Operator::Add, ["failures", "successes"])
            .build();

        assert_eq!(
            expression_of(&schema, "transactions"),
            quote!(self.failures() + self.successes()).to_string()
        );
    }

    #[test]
    fn division_widens_only_last_operand() {
        let schema = Schema::builder()
            .counter("a")
            .counter("b")
            .counter("c")
            .compound("ratio", Operator::Divide, ["a", "b", "c"])
            .build();

        assert_eq!(
            expression_of(&schema, "ratio"),
            quote!((self.a() / self.b()) as f64 / self.c() as f64).to_string()
        );
    }

    #[test]
    fn fractional_operand_widens_integral_side() {
        let schema = Schema::builder()
            .counter("a")
            .counter("b")
            .compound("ratio", Operator::Divide, ["a", "b"])
            .compound("shifted", Operator::Subtract, ["ratio", "a"])
            .build();

        assert_eq!(
            expression_of(&schema, "ratio"),
            quote!(self.a() as f64 / self.b() as f64).to_string()
        );
        assert_eq!(
            expression_of(&schema, "shifted"),
            quote!(self.ratio() - self.a() as f64).to_string()
        );
    }

    #[test]
    fn value_type_tokens_match_rust_types() {
        assert_eq!(value_type_tokens(ValueType::Integer).to_string(), "u64");
        assert_eq!(value_type_tokens(ValueType::Float).to_string(), "f64");
    }
}
