use std::borrow::Cow;

/// The display name of a metric: lower-case words separated by single spaces,
/// e.g. `max write size`.
///
/// Typically metric names are `&'static str` but schemas loaded from configuration
/// files carry owned strings, so we accept both via `Cow`.
pub type MetricName = Cow<'static, str>;

/// Base accumulation policy of a raw metric. Every kind starts at zero.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum MetricKind {
    /// Incremented by one per hook call.
    Counter,

    /// Keeps the largest value observed.
    Max,

    /// Adds every observed value.
    Sum,
}

/// Arithmetic applied left to right over the operands of a compound metric.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Operator {
    Add,
    Subtract,

    /// Only the last operand is widened to a fractional value.
    Divide,
}

impl Operator {
    /// The source symbol of the operator, as written in schemas.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Divide => "/",
        }
    }

    /// Parses the source symbol of an operator.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Self::Add),
            "-" => Some(Self::Subtract),
            "/" => Some(Self::Divide),
            _ => None,
        }
    }
}

/// A raw quantity accumulated independently per thread.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BaseMetric {
    pub(crate) name: MetricName,
    pub(crate) kind: MetricKind,
}

impl BaseMetric {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> MetricKind {
        self.kind
    }
}

/// A value derived by a fixed arithmetic expression over other metrics.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompoundMetric {
    pub(crate) name: MetricName,
    pub(crate) operator: Operator,
    pub(crate) operands: Vec<MetricName>,
}

impl CompoundMetric {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn operands(&self) -> impl Iterator<Item = &str> {
        self.operands.iter().map(|operand| &**operand)
    }
}

/// One entry of a schema, in declaration order.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Declaration {
    Base(BaseMetric),
    Compound(CompoundMetric),
}

impl Declaration {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Base(metric) => metric.name(),
            Self::Compound(metric) => metric.name(),
        }
    }
}

/// The three explicitly authored orderings. Any of them may be partial.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OrderingSpec {
    /// Order of base metric fields in the record.
    pub(crate) storage: Vec<MetricName>,

    /// Order of compound metric accessors.
    pub(crate) derivation: Vec<MetricName>,

    /// Order of lines in rendered reports. Covers base and compound metrics alike.
    pub(crate) display: Vec<MetricName>,

    /// If set, a non-empty list must already name every key it covers.
    pub(crate) strict: bool,
}

/// A declarative statistics schema: metric declarations plus orderings.
///
/// A schema is inert data. Use [`compile()`][crate::compile] to validate it and
/// resolve its orderings.
///
/// # Example
///
/// ```
/// use tallies_macros_impl::{Operator, Schema};
///
/// let schema = Schema::builder()
///     .counter("successes")
///     .counter("failures")
///     .compound("transactions", Operator::Add, ["successes", "failures"])
///     .display_order(["transactions"])
///     .build();
///
/// assert_eq!(schema.declarations().count(), 3);
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Schema {
    pub(crate) declarations: Vec<Declaration>,
    pub(crate) ordering: OrderingSpec,
}

impl Schema {
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// All declarations in schema-declaration order.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    pub fn base_metrics(&self) -> impl Iterator<Item = &BaseMetric> {
        self.declarations.iter().filter_map(|declaration| match declaration {
            Declaration::Base(metric) => Some(metric),
            Declaration::Compound(_) => None,
        })
    }

    pub fn compound_metrics(&self) -> impl Iterator<Item = &CompoundMetric> {
        self.declarations.iter().filter_map(|declaration| match declaration {
            Declaration::Compound(metric) => Some(metric),
            Declaration::Base(_) => None,
        })
    }

    #[must_use]
    pub fn ordering(&self) -> &OrderingSpec {
        &self.ordering
    }
}

/// Creates instances of [`Schema`].
///
/// Declarations are kept in the order the builder methods are called. That order is what
/// the ordering resolver appends unlisted metrics in.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Declares a base metric of the given kind.
    #[must_use]
    pub fn base(mut self, name: impl Into<MetricName>, kind: MetricKind) -> Self {
        self.schema.declarations.push(Declaration::Base(BaseMetric {
            name: name.into(),
            kind,
        }));
        self
    }

    #[must_use]
    pub fn counter(self, name: impl Into<MetricName>) -> Self {
        self.base(name, MetricKind::Counter)
    }

    #[must_use]
    pub fn max(self, name: impl Into<MetricName>) -> Self {
        self.base(name, MetricKind::Max)
    }

    #[must_use]
    pub fn sum(self, name: impl Into<MetricName>) -> Self {
        self.base(name, MetricKind::Sum)
    }

    /// Declares a compound metric. Operands may name base or compound metrics declared
    /// anywhere in the schema, before or after this one.
    #[must_use]
    pub fn compound<I, N>(mut self, name: impl Into<MetricName>, operator: Operator, operands: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<MetricName>,
    {
        self.schema
            .declarations
            .push(Declaration::Compound(CompoundMetric {
                name: name.into(),
                operator,
                operands: operands.into_iter().map(Into::into).collect(),
            }));
        self
    }

    #[must_use]
    pub fn storage_order<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<MetricName>,
    {
        self.schema.ordering.storage = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn derivation_order<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<MetricName>,
    {
        self.schema.ordering.derivation = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn display_order<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<MetricName>,
    {
        self.schema.ordering.display = names.into_iter().map(Into::into).collect();
        self
    }

    /// Requires every non-empty ordering list to be complete instead of appending the
    /// metrics it leaves out.
    #[must_use]
    pub fn strict_orderings(mut self) -> Self {
        self.schema.ordering.strict = true;
        self
    }

    #[must_use]
    pub fn build(self) -> Schema {
        self.schema
    }
}
