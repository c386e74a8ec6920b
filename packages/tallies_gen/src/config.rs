use tallies_macros_impl::{
    Instrumentation, MetricKind, Naming, Operator, Overrides, Schema, SchemaBuilder,
};
use toml::{Table, Value};
use tracing::debug;

use crate::{Error, Result};

const TOP_LEVEL_KEYS: &[&str] = &["naming", "order", "metric", "overrides"];
const NAMING_KEYS: &[&str] = &[
    "hook_prefix",
    "record",
    "aggregator",
    "module",
    "runtime",
    "toggle_feature",
];
const ORDER_KEYS: &[&str] = &["strict", "storage", "derivation", "display"];
const METRIC_KEYS: &[&str] = &["name", "kind", "op", "operands"];

/// Everything a schema file configures.
#[derive(Debug)]
pub(crate) struct GenConfig {
    pub(crate) schema: Schema,
    pub(crate) naming: Naming,
    pub(crate) instrumentation: Instrumentation,
    pub(crate) overrides: Overrides,
}

/// Parses a TOML schema file.
///
/// Metrics are declared in `[[metric]]` order. Without a `toggle_feature` the generated
/// hooks are always enabled.
pub(crate) fn parse_config(text: &str) -> Result<GenConfig> {
    let document: Table = toml::from_str(text)?;
    check_keys(&document, TOP_LEVEL_KEYS, "")?;

    let (naming, instrumentation) = match document.get("naming") {
        Some(naming) => parse_naming(as_table(naming, "naming")?)?,
        None => (Naming::default(), Instrumentation::Enabled),
    };

    let mut builder = Schema::builder();

    let metrics = match document.get("metric") {
        Some(Value::Array(metrics)) => metrics.as_slice(),
        Some(_) => return Err(Error::wrong_type("metric", "an array of tables")),
        None => &[],
    };

    for metric in metrics {
        builder = parse_metric(builder, as_table(metric, "metric")?)?;
    }

    if let Some(order) = document.get("order") {
        builder = parse_order(builder, as_table(order, "order")?)?;
    }

    let overrides = match document.get("overrides") {
        Some(overrides) => parse_overrides(as_table(overrides, "overrides")?)?,
        None => Overrides::new(),
    };

    debug!(
        metrics = metrics.len(),
        overrides = overrides.iter().count(),
        "parsed schema configuration"
    );

    Ok(GenConfig {
        schema: builder.build(),
        naming,
        instrumentation,
        overrides,
    })
}

fn parse_naming(table: &Table) -> Result<(Naming, Instrumentation)> {
    check_keys(table, NAMING_KEYS, "naming.")?;

    let mut naming = Naming::default();

    if let Some(prefix) = optional_str(table, "hook_prefix", "naming.")? {
        naming = naming.hook_prefix(prefix);
    }

    if let Some(record) = optional_str(table, "record", "naming.")? {
        naming = naming.record(record);
    }

    if let Some(aggregator) = optional_str(table, "aggregator", "naming.")? {
        naming = naming.aggregator(aggregator);
    }

    if let Some(module) = optional_str(table, "module", "naming.")? {
        naming = naming.module(module);
    }

    if let Some(runtime) = optional_str(table, "runtime", "naming.")? {
        naming = naming.runtime(parse_path(runtime, "naming.runtime")?);
    }

    let instrumentation = match optional_str(table, "toggle_feature", "naming.")? {
        Some(feature) => Instrumentation::Feature(feature.to_string()),
        None => Instrumentation::Enabled,
    };

    Ok((naming, instrumentation))
}

fn parse_metric(builder: SchemaBuilder, table: &Table) -> Result<SchemaBuilder> {
    check_keys(table, METRIC_KEYS, "metric.")?;

    let name = optional_str(table, "name", "metric.")?.ok_or_else(|| Error::MissingKey {
        key: "metric.name".to_string(),
    })?;

    let kind = optional_str(table, "kind", "metric.")?;
    let op = optional_str(table, "op", "metric.")?;

    match (kind, op) {
        (Some(kind), None) => {
            if table.contains_key("operands") {
                return Err(Error::invalid_metric(name, "base metrics take no operands"));
            }

            let kind = match kind {
                "counter" => MetricKind::Counter,
                "max" => MetricKind::Max,
                "sum" => MetricKind::Sum,
                other => {
                    return Err(Error::invalid_metric(
                        name,
                        format!("unknown kind '{other}', expected counter, max or sum"),
                    ));
                }
            };

            Ok(builder.base(name.to_string(), kind))
        }
        (None, Some(op)) => {
            let operator = Operator::from_symbol(op).ok_or_else(|| {
                Error::invalid_metric(name, format!("unknown operator '{op}', expected +, - or /"))
            })?;

            let operands = string_array(
                table.get("operands").ok_or_else(|| Error::MissingKey {
                    key: format!("operands of metric '{name}'"),
                })?,
                "metric.operands",
            )?;

            Ok(builder.compound(name.to_string(), operator, operands))
        }
        (Some(_), Some(_)) => Err(Error::invalid_metric(
            name,
            "a metric has either a kind or an operator, not both",
        )),
        (None, None) => Err(Error::invalid_metric(
            name,
            "a metric needs a kind (base metric) or an op (compound metric)",
        )),
    }
}

fn parse_order(mut builder: SchemaBuilder, table: &Table) -> Result<SchemaBuilder> {
    check_keys(table, ORDER_KEYS, "order.")?;

    match table.get("strict") {
        Some(Value::Boolean(true)) => builder = builder.strict_orderings(),
        Some(Value::Boolean(false)) | None => {}
        Some(_) => return Err(Error::wrong_type("order.strict", "a boolean")),
    }

    if let Some(storage) = table.get("storage") {
        builder = builder.storage_order(string_array(storage, "order.storage")?);
    }

    if let Some(derivation) = table.get("derivation") {
        builder = builder.derivation_order(string_array(derivation, "order.derivation")?);
    }

    if let Some(display) = table.get("display") {
        builder = builder.display_order(string_array(display, "order.display")?);
    }

    Ok(builder)
}

/// Overrides come out sorted by hook name, whatever their order in the file.
fn parse_overrides(table: &Table) -> Result<Overrides> {
    let mut overrides = Overrides::new();

    for (hook, target) in table {
        let key = format!("overrides.{hook}");
        let target = target
            .as_str()
            .ok_or_else(|| Error::wrong_type(key.as_str(), "a string"))?;

        overrides.insert(hook.as_str(), parse_path(target, &key)?);
    }

    Ok(overrides)
}

fn check_keys(table: &Table, allowed: &[&str], prefix: &str) -> Result<()> {
    match table.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(unknown) => Err(Error::UnknownKey {
            key: format!("{prefix}{unknown}"),
        }),
        None => Ok(()),
    }
}

fn as_table<'a>(value: &'a Value, key: &str) -> Result<&'a Table> {
    value
        .as_table()
        .ok_or_else(|| Error::wrong_type(key, "a table"))
}

fn optional_str<'a>(table: &'a Table, key: &str, prefix: &str) -> Result<Option<&'a str>> {
    table
        .get(key)
        .map(|value| {
            value
                .as_str()
                .ok_or_else(|| Error::wrong_type(format!("{prefix}{key}"), "a string"))
        })
        .transpose()
}

fn string_array(value: &Value, key: &str) -> Result<Vec<String>> {
    value
        .as_array()
        .ok_or_else(|| Error::wrong_type(key, "an array of strings"))?
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| Error::wrong_type(key, "an array of strings"))
        })
        .collect()
}

fn parse_path(path: &str, key: &str) -> Result<syn::Path> {
    syn::parse_str(path).map_err(|_| Error::InvalidPath {
        key: key.to_string(),
        path: path.to_string(),
    })
}
