//! The `stats!` input language.
//!
//! ```text
//! stats! {
//!     record = ThreadRecord;
//!     aggregator = TransactionLog;
//!     hook_prefix = "log_";
//!     module = transaction_log;
//!     runtime = ::tallies;
//!     strict_orderings;
//!
//!     base {
//!         "reads": sum,
//!         "max write size": max,
//!         "successes": counter,
//!         "failures": counter,
//!     }
//!
//!     compound {
//!         "transactions" = "successes" + "failures",
//!         "average read size" = "reads" / "transactions",
//!     }
//!
//!     storage_order ["reads"];
//!     derivation_order ["transactions"];
//!     display_order ["transactions", "average read size"];
//!
//!     overrides {
//!         dump = crate::print_summary,
//!         "reads" = crate::trace_read,
//!     }
//! }
//! ```
//!
//! Every section is optional. Settings end with `;`, blocks may.

use foldhash::{HashMap, HashMapExt};
use proc_macro2::{Span, TokenStream};
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Ident, LitStr, Path, Token, braced, bracketed};

use crate::{
    Instrumentation, MetricKind, MetricName, Naming, Operator, Overrides, Schema, SchemaBuilder,
    generate,
};

/// Expands a `stats!` invocation. Errors become `compile_error!` invocations pointing at
/// the offending input.
#[must_use]
pub fn entrypoint(input: &TokenStream, instrumentation: &Instrumentation) -> TokenStream {
    match expand(input, instrumentation) {
        Ok(tokens) => tokens,
        Err(error) => error.to_compile_error(),
    }
}

fn expand(input: &TokenStream, instrumentation: &Instrumentation) -> syn::Result<TokenStream> {
    let definition = syn::parse2::<StatsDefinition>(input.clone())?;

    generate(
        &definition.schema,
        &definition.naming,
        instrumentation,
        &definition.overrides,
    )
    .map_err(|error| {
        let span = error
            .metric_name()
            .and_then(|name| {
                definition
                    .spans
                    .get(name)
                    .or_else(|| definition.references.get(name))
                    .copied()
            })
            .unwrap_or_else(Span::call_site);

        syn::Error::new(span, error.to_string())
    })
}

/// Everything a `stats!` invocation declares.
pub(crate) struct StatsDefinition {
    pub(crate) schema: Schema,
    pub(crate) naming: Naming,
    pub(crate) overrides: Overrides,

    /// Where each metric (or overridden hook) was first written, for diagnostics.
    spans: HashMap<String, Span>,

    /// Where each compound operand was first referenced. Used for names that were never
    /// declared.
    references: HashMap<String, Span>,
}

/// Tracks which settings have already been given so that repeats can be reported.
#[derive(Default)]
struct Seen(Vec<String>);

impl Seen {
    fn check(&mut self, key: &Ident) -> syn::Result<()> {
        let key_text = key.to_string();

        if self.0.contains(&key_text) {
            return Err(syn::Error::new(key.span(), format!("`{key}` is given more than once")));
        }

        self.0.push(key_text);
        Ok(())
    }
}

impl Parse for StatsDefinition {
    fn parse(input: ParseStream<'_>) -> syn::Result<Self> {
        let mut builder = SchemaBuilder::default();
        let mut naming = Naming::default();
        let mut overrides = Overrides::new();
        let mut spans = HashMap::new();
        let mut references = HashMap::new();
        let mut seen = Seen::default();

        while !input.is_empty() {
            let key: Ident = input.parse()?;
            seen.check(&key)?;

            match key.to_string().as_str() {
                "record" => {
                    naming = naming.record(parse_ident_setting(input)?.to_string());
                }
                "aggregator" => {
                    naming = naming.aggregator(parse_ident_setting(input)?.to_string());
                }
                "module" => {
                    naming = naming.module(parse_ident_setting(input)?.to_string());
                }
                "hook_prefix" => {
                    input.parse::<Token![=]>()?;
                    let prefix: LitStr = input.parse()?;
                    input.parse::<Token![;]>()?;
                    naming = naming.hook_prefix(prefix.value());
                }
                "runtime" => {
                    input.parse::<Token![=]>()?;
                    let runtime: Path = input.parse()?;
                    input.parse::<Token![;]>()?;
                    naming = naming.runtime(runtime);
                }
                "strict_orderings" => {
                    input.parse::<Token![;]>()?;
                    builder = builder.strict_orderings();
                }
                "base" => {
                    let content;
                    braced!(content in input);

                    for entry in Punctuated::<BaseEntry, Token![,]>::parse_terminated(&content)? {
                        spans.entry(entry.name.value()).or_insert_with(|| entry.name.span());
                        builder = builder.base(entry.name.value(), entry.kind);
                    }

                    skip_semicolon(input)?;
                }
                "compound" => {
                    let content;
                    braced!(content in input);

                    for entry in
                        Punctuated::<CompoundEntry, Token![,]>::parse_terminated(&content)?
                    {
                        spans.entry(entry.name.value()).or_insert_with(|| entry.name.span());

                        for operand in &entry.operands {
                            references
                                .entry(operand.value())
                                .or_insert_with(|| operand.span());
                        }

                        builder = builder.compound(
                            entry.name.value(),
                            entry.operator,
                            entry.operands.iter().map(LitStr::value),
                        );
                    }

                    skip_semicolon(input)?;
                }
                "storage_order" => {
                    builder = builder.storage_order(parse_name_list(input)?);
                }
                "derivation_order" => {
                    builder = builder.derivation_order(parse_name_list(input)?);
                }
                "display_order" => {
                    builder = builder.display_order(parse_name_list(input)?);
                }
                "overrides" => {
                    let content;
                    braced!(content in input);

                    for entry in
                        Punctuated::<OverrideEntry, Token![,]>::parse_terminated(&content)?
                    {
                        spans.entry(entry.hook.clone()).or_insert(entry.span);
                        overrides.insert(entry.hook, entry.target);
                    }

                    skip_semicolon(input)?;
                }
                other => {
                    return Err(syn::Error::new(
                        key.span(),
                        format!(
                            "unknown setting `{other}`, expected one of: record, aggregator, \
                             module, hook_prefix, runtime, strict_orderings, base, compound, \
                             storage_order, derivation_order, display_order, overrides"
                        ),
                    ));
                }
            }
        }

        Ok(Self {
            schema: builder.build(),
            naming,
            overrides,
            spans,
            references,
        })
    }
}

fn parse_ident_setting(input: ParseStream<'_>) -> syn::Result<Ident> {
    input.parse::<Token![=]>()?;
    let value: Ident = input.parse()?;
    input.parse::<Token![;]>()?;
    Ok(value)
}

fn skip_semicolon(input: ParseStream<'_>) -> syn::Result<()> {
    if input.peek(Token![;]) {
        input.parse::<Token![;]>()?;
    }

    Ok(())
}

/// `["a", "b"]` followed by an optional `;`.
fn parse_name_list(input: ParseStream<'_>) -> syn::Result<Vec<MetricName>> {
    let content;
    bracketed!(content in input);

    let names = Punctuated::<LitStr, Token![,]>::parse_terminated(&content)?
        .iter()
        .map(|name| MetricName::from(name.value()))
        .collect();

    skip_semicolon(input)?;
    Ok(names)
}

/// `"name": counter`
struct BaseEntry {
    name: LitStr,
    kind: MetricKind,
}

impl Parse for BaseEntry {
    fn parse(input: ParseStream<'_>) -> syn::Result<Self> {
        let name: LitStr = input.parse()?;
        input.parse::<Token![:]>()?;
        let kind: Ident = input.parse()?;

        let kind = match kind.to_string().as_str() {
            "counter" => MetricKind::Counter,
            "max" => MetricKind::Max,
            "sum" => MetricKind::Sum,
            other => {
                return Err(syn::Error::new(
                    kind.span(),
                    format!("unknown metric kind `{other}`, expected counter, max or sum"),
                ));
            }
        };

        Ok(Self { name, kind })
    }
}

/// `"name" = "a" / "b" / "c"`
struct CompoundEntry {
    name: LitStr,
    operator: Operator,
    operands: Vec<LitStr>,
}

impl Parse for CompoundEntry {
    fn parse(input: ParseStream<'_>) -> syn::Result<Self> {
        let name: LitStr = input.parse()?;
        input.parse::<Token![=]>()?;

        let mut operands = vec![input.parse::<LitStr>()?];
        let mut operator = None;

        while !input.is_empty() && !input.peek(Token![,]) {
            let (next, span) = parse_operator(input)?;

            match operator {
                None => operator = Some(next),
                Some(previous) if previous != next => {
                    return Err(syn::Error::new(
                        span,
                        format!(
                            "a compound metric applies one operator to all its operands, \
                             found both `{}` and `{}`",
                            previous.symbol(),
                            next.symbol()
                        ),
                    ));
                }
                Some(_) => {}
            }

            operands.push(input.parse()?);
        }

        // A single operand still needs an operator to be a valid expression. The schema
        // check reports the operand count.
        let operator = operator.unwrap_or(Operator::Add);

        Ok(Self {
            name,
            operator,
            operands,
        })
    }
}

fn parse_operator(input: ParseStream<'_>) -> syn::Result<(Operator, Span)> {
    let lookahead = input.lookahead1();

    if lookahead.peek(Token![+]) {
        let token = input.parse::<Token![+]>()?;
        Ok((Operator::Add, token.span()))
    } else if lookahead.peek(Token![-]) {
        let token = input.parse::<Token![-]>()?;
        Ok((Operator::Subtract, token.span()))
    } else if lookahead.peek(Token![/]) {
        let token = input.parse::<Token![/]>()?;
        Ok((Operator::Divide, token.span()))
    } else {
        Err(lookahead.error())
    }
}

/// `dump = path` or `"metric name" = path`
struct OverrideEntry {
    hook: String,
    span: Span,
    target: Path,
}

impl Parse for OverrideEntry {
    fn parse(input: ParseStream<'_>) -> syn::Result<Self> {
        let (hook, span) = if input.peek(LitStr) {
            let name: LitStr = input.parse()?;
            (name.value(), name.span())
        } else {
            let name: Ident = input.parse()?;
            (name.to_string(), name.span())
        };

        input.parse::<Token![=]>()?;
        let target: Path = input.parse()?;

        Ok(Self { hook, span, target })
    }
}
