use foldhash::{HashMap, HashMapExt, HashSet, HashSetExt};
use proc_macro2::Ident;
use tracing::debug;

use crate::naming::{parse_ident, snake_name};
use crate::ordering::{Ordering, resolve};
use crate::{
    CompoundMetric, Declaration, MetricKind, Operator, Result, Schema, SchemaError,
};

/// Names that generated items already use in the record, aggregator or hook namespaces.
const RESERVED_NAMES: &[&str] = &[
    "new",
    "publish",
    "clear",
    "dump",
    "record_count",
    "records",
    "results",
    "write_summary",
    "with_current",
    "take_current",
];

/// The numeric type a metric evaluates to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ValueType {
    /// `u64` - every base metric and any compound that never widens.
    Integer,

    /// `f64` - any compound that divides or mixes in a fractional operand.
    Float,
}

impl ValueType {
    /// The result type of combining an accumulated left-hand value with the next operand.
    ///
    /// The last operand of a division is always widened before it takes part.
    pub(crate) fn combine(self, operand: Self, widen_operand: bool) -> Self {
        if self == Self::Float || operand == Self::Float || widen_operand {
            Self::Float
        } else {
            Self::Integer
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct BaseEntry {
    pub(crate) name: String,
    pub(crate) kind: MetricKind,

    /// Field and getter name.
    pub(crate) ident: Ident,

    /// Record method that applies one hook call to the field.
    pub(crate) mutator: Ident,
}

#[derive(Clone, Debug)]
pub(crate) struct CompoundEntry {
    pub(crate) name: String,
    pub(crate) operator: Operator,
    pub(crate) operands: Vec<String>,
    pub(crate) value_type: ValueType,
    pub(crate) ident: Ident,
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum MetricRef<'a> {
    Base(&'a BaseEntry),
    Compound(&'a CompoundEntry),
}

impl<'a> MetricRef<'a> {
    pub(crate) fn ident(self) -> &'a Ident {
        match self {
            Self::Base(entry) => &entry.ident,
            Self::Compound(entry) => &entry.ident,
        }
    }

    pub(crate) fn value_type(self) -> ValueType {
        match self {
            Self::Base(_) => ValueType::Integer,
            Self::Compound(entry) => entry.value_type,
        }
    }
}

/// A validated schema with all three orderings resolved.
///
/// This is the input of every emitter. Once it exists, emission cannot fail on account of
/// the metric definitions.
#[derive(Clone, Debug)]
pub struct CompiledSchema {
    /// Base metrics in storage order.
    pub(crate) storage: Vec<BaseEntry>,

    /// Compound metrics in derivation order.
    pub(crate) derivation: Vec<CompoundEntry>,

    /// All metric names in display order.
    pub(crate) display: Vec<String>,

    base_index: HashMap<String, usize>,
    compound_index: HashMap<String, usize>,
}

impl CompiledSchema {
    pub(crate) fn metric(&self, name: &str) -> MetricRef<'_> {
        if let Some(&index) = self.base_index.get(name) {
            return MetricRef::Base(
                self.storage
                    .get(index)
                    .expect("index built from the same vector"),
            );
        }

        let index = *self
            .compound_index
            .get(name)
            .expect("operand and ordering names were validated during compilation");

        MetricRef::Compound(
            self.derivation
                .get(index)
                .expect("index built from the same vector"),
        )
    }

    /// Base metric names in storage order.
    pub fn storage_order(&self) -> impl Iterator<Item = &str> {
        self.storage.iter().map(|entry| entry.name.as_str())
    }

    /// Compound metric names in derivation order.
    pub fn derivation_order(&self) -> impl Iterator<Item = &str> {
        self.derivation.iter().map(|entry| entry.name.as_str())
    }

    /// All metric names in display order.
    pub fn display_order(&self) -> impl Iterator<Item = &str> {
        self.display.iter().map(String::as_str)
    }

    /// The value type of a metric, or `None` if the schema has no such metric.
    #[must_use]
    pub fn value_type(&self, name: &str) -> Option<ValueType> {
        if self.base_index.contains_key(name) || self.compound_index.contains_key(name) {
            Some(self.metric(name).value_type())
        } else {
            None
        }
    }
}

/// Validates a schema and resolves its orderings.
///
/// # Errors
///
/// Returns the first [`SchemaError`] found. Checks run in this order: metric names,
/// duplicates, compound operands, cycles, orderings.
pub fn compile(schema: &Schema) -> Result<CompiledSchema> {
    let declared = check_names(schema)?;

    for compound in schema.compound_metrics() {
        check_operands(compound, &declared)?;
    }

    let compounds = schema
        .compound_metrics()
        .map(|compound| (compound.name(), compound))
        .collect::<HashMap<_, _>>();

    check_cycles(schema, &compounds)?;

    let value_types = infer_value_types(schema, &compounds);

    let base_names = schema.base_metrics().map(|m| m.name()).collect::<Vec<_>>();
    let compound_names = schema.compound_metrics().map(|m| m.name()).collect::<Vec<_>>();
    let all_names = schema.declarations().map(Declaration::name).collect::<Vec<_>>();

    let ordering = schema.ordering();

    let storage_order = resolve(Ordering::Storage, &ordering.storage, &base_names, ordering.strict)?;
    let derivation_order = resolve(
        Ordering::Derivation,
        &ordering.derivation,
        &compound_names,
        ordering.strict,
    )?;
    let display_order = resolve(Ordering::Display, &ordering.display, &all_names, ordering.strict)?;

    check_display_covers_everything(&display_order, &all_names)?;

    debug!(
        storage = ?storage_order,
        derivation = ?derivation_order,
        display = ?display_order,
        "resolved statistics schema orderings"
    );

    let bases = schema
        .base_metrics()
        .map(|metric| (metric.name(), metric.kind()))
        .collect::<HashMap<_, _>>();

    let storage = storage_order
        .into_iter()
        .map(|name| {
            let kind = *bases.get(name.as_str()).expect("resolved from base names");
            Ok(BaseEntry {
                ident: parse_ident(&snake_name(&name))?,
                mutator: parse_ident(&mutator_name(&name, kind))?,
                kind,
                name,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let derivation = derivation_order
        .into_iter()
        .map(|name| {
            let compound = *compounds.get(name.as_str()).expect("resolved from compound names");
            Ok(CompoundEntry {
                ident: parse_ident(&snake_name(&name))?,
                operator: compound.operator(),
                operands: compound.operands().map(str::to_string).collect(),
                value_type: *value_types
                    .get(name.as_str())
                    .expect("every compound metric has an inferred type"),
                name,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let base_index = storage
        .iter()
        .enumerate()
        .map(|(i, entry)| (entry.name.clone(), i))
        .collect();
    let compound_index = derivation
        .iter()
        .enumerate()
        .map(|(i, entry)| (entry.name.clone(), i))
        .collect();

    Ok(CompiledSchema {
        storage,
        derivation,
        display: display_order,
        base_index,
        compound_index,
    })
}

fn mutator_name(name: &str, kind: MetricKind) -> String {
    let verb = match kind {
        MetricKind::Counter => "count",
        MetricKind::Max => "observe",
        MetricKind::Sum => "add",
    };

    format!("{verb}_{}", snake_name(name))
}

/// Checks that every name is usable as an identifier and that neither the names nor the
/// identifiers generated from them collide. Returns the set of declared names.
fn check_names(schema: &Schema) -> Result<HashSet<&str>> {
    let mut declared = HashSet::new();

    // Generated identifier -> the metric name that produced it.
    let mut idents = HashMap::<String, &str>::new();

    for declaration in schema.declarations() {
        let name = declaration.name();

        if name.trim().is_empty() {
            return Err(SchemaError::invalid_name(name, "metric names must not be empty"));
        }

        if !declared.insert(name) {
            return Err(SchemaError::duplicate(name, "metric declarations"));
        }

        let ident = snake_name(name);
        parse_ident(&ident)
            .map_err(|_| SchemaError::invalid_name(name, "does not form a Rust identifier"))?;

        if RESERVED_NAMES.contains(&ident.as_str()) {
            return Err(SchemaError::invalid_name(
                name,
                format!("'{ident}' is reserved for a generated item"),
            ));
        }

        if let Some(previous) = idents.insert(ident.clone(), name) {
            return Err(SchemaError::duplicate(
                ident,
                format!("generated identifiers (from '{previous}' and '{name}')"),
            ));
        }
    }

    for metric in schema.base_metrics() {
        let mutator = mutator_name(metric.name(), metric.kind());

        if let Some(previous) = idents.get(&mutator) {
            return Err(SchemaError::duplicate(
                mutator,
                format!(
                    "generated identifiers (from '{previous}' and '{}')",
                    metric.name()
                ),
            ));
        }
    }

    Ok(declared)
}

fn check_operands(compound: &CompoundMetric, declared: &HashSet<&str>) -> Result<()> {
    let count = compound.operands().count();

    if count < 2 {
        return Err(SchemaError::TooFewOperands {
            compound: compound.name().to_string(),
            count,
        });
    }

    if let Some(unknown) = compound.operands().find(|operand| !declared.contains(operand)) {
        return Err(SchemaError::UnknownOperandReference {
            compound: compound.name().to_string(),
            operand: unknown.to_string(),
        });
    }

    Ok(())
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Visit {
    InProgress,
    Done,
}

fn check_cycles(schema: &Schema, compounds: &HashMap<&str, &CompoundMetric>) -> Result<()> {
    let mut visits = HashMap::with_capacity(compounds.len());
    let mut path = Vec::new();

    for compound in schema.compound_metrics() {
        visit(compound.name(), compounds, &mut visits, &mut path)?;
    }

    Ok(())
}

fn visit<'a>(
    name: &'a str,
    compounds: &HashMap<&'a str, &'a CompoundMetric>,
    visits: &mut HashMap<&'a str, Visit>,
    path: &mut Vec<&'a str>,
) -> Result<()> {
    // Base metrics are leaves.
    let Some(&compound) = compounds.get(name) else {
        return Ok(());
    };

    match visits.get(name) {
        Some(Visit::Done) => return Ok(()),
        Some(Visit::InProgress) => {
            let start = path
                .iter()
                .position(|entry| *entry == name)
                .expect("an in-progress metric is always on the path");

            let mut cycle = path
                .get(start..)
                .expect("position() returned an index within the path")
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>();
            cycle.push(name.to_string());

            return Err(SchemaError::CyclicCompoundReference { cycle });
        }
        None => {}
    }

    visits.insert(name, Visit::InProgress);
    path.push(name);

    for operand in compound.operands() {
        visit(operand, compounds, visits, path)?;
    }

    path.pop();
    visits.insert(name, Visit::Done);

    Ok(())
}

/// Infers the value type of every compound metric. Must only run on an acyclic schema.
fn infer_value_types<'a>(
    schema: &'a Schema,
    compounds: &HashMap<&'a str, &'a CompoundMetric>,
) -> HashMap<&'a str, ValueType> {
    let mut types = HashMap::with_capacity(compounds.len());

    for compound in schema.compound_metrics() {
        infer(compound.name(), compounds, &mut types);
    }

    types
}

fn infer<'a>(
    name: &'a str,
    compounds: &HashMap<&'a str, &'a CompoundMetric>,
    types: &mut HashMap<&'a str, ValueType>,
) -> ValueType {
    let Some(&compound) = compounds.get(name) else {
        return ValueType::Integer;
    };

    if let Some(known) = types.get(name) {
        return *known;
    }

    let last = compound.operands.len().saturating_sub(1);

    let value_type = compound
        .operands()
        .enumerate()
        .map(|(i, operand)| (i, infer(operand, compounds, types)))
        .reduce(|(_, accumulated), (i, operand)| {
            let widen = compound.operator() == Operator::Divide && i == last;
            (i, accumulated.combine(operand, widen))
        })
        .map_or(ValueType::Integer, |(_, value_type)| value_type);

    types.insert(name, value_type);
    value_type
}

fn check_display_covers_everything(display: &[String], all_names: &[&str]) -> Result<()> {
    let shown = display.iter().map(String::as_str).collect::<HashSet<_>>();

    if shown.len() != display.len() {
        return Err(SchemaError::incomplete("display", "an entry appears twice"));
    }

    if let Some(missing) = all_names.iter().find(|name| !shown.contains(*name)) {
        return Err(SchemaError::incomplete(
            "display",
            format!("'{missing}' is never displayed"),
        ));
    }

    if shown.len() != all_names.len() {
        return Err(SchemaError::incomplete(
            "display",
            "it lists metrics the schema does not declare",
        ));
    }

    Ok(())
}
