use thiserror::Error;

/// Reasons a statistics schema cannot be compiled.
///
/// Every check runs before anything is emitted, so a failed compilation never
/// produces partial output.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum SchemaError {
    /// A metric name is declared twice, an ordering repeats an entry, or two different
    /// names map to the same generated identifier.
    #[error("duplicate name '{name}' in {context}")]
    DuplicateName {
        /// The repeated name (or generated identifier).
        name: String,

        /// Where the repetition was found, e.g. `metric declarations` or `display order`.
        context: String,
    },

    /// A compound metric refers to a metric that the schema does not declare.
    #[error("compound metric '{compound}' references unknown metric '{operand}'")]
    UnknownOperandReference { compound: String, operand: String },

    /// An ordering names a metric it may not contain, or leaves one out in strict mode.
    #[error("{ordering} order is incomplete: {problem}")]
    IncompleteOrdering {
        /// Which of the three orderings is affected.
        ordering: String,

        /// A human-readable description of the mismatch.
        problem: String,
    },

    /// A compound metric transitively references itself.
    #[error("compound metrics form a cycle: {}", cycle.join(" -> "))]
    CyclicCompoundReference {
        /// The names along the cycle; the first name is repeated at the end.
        cycle: Vec<String>,
    },

    /// A compound metric has fewer than two operands.
    #[error("compound metric '{compound}' needs at least 2 operands, found {count}")]
    TooFewOperands { compound: String, count: usize },

    /// A metric name cannot be turned into a Rust identifier or is reserved.
    #[error("invalid metric name '{name}': {problem}")]
    InvalidName { name: String, problem: String },

    /// A hook override targets a hook that the schema does not produce.
    #[error("cannot override unknown hook '{hook}'")]
    InvalidOverride { hook: String },
}

impl SchemaError {
    pub(crate) fn duplicate(name: impl Into<String>, context: impl Into<String>) -> Self {
        Self::DuplicateName {
            name: name.into(),
            context: context.into(),
        }
    }

    pub(crate) fn incomplete(ordering: impl Into<String>, problem: impl Into<String>) -> Self {
        Self::IncompleteOrdering {
            ordering: ordering.into(),
            problem: problem.into(),
        }
    }

    pub(crate) fn invalid_name(name: impl Into<String>, problem: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            problem: problem.into(),
        }
    }

    /// The metric name the error is about, if it concerns a single metric.
    ///
    /// Front ends use this to point diagnostics at the offending declaration.
    #[must_use]
    pub fn metric_name(&self) -> Option<&str> {
        match self {
            Self::DuplicateName { name, .. } | Self::InvalidName { name, .. } => Some(name),
            Self::UnknownOperandReference { operand, .. } => Some(operand),
            Self::TooFewOperands { compound, .. } => Some(compound),
            Self::CyclicCompoundReference { cycle } => cycle.first().map(String::as_str),
            Self::InvalidOverride { hook } => Some(hook),
            Self::IncompleteOrdering { .. } => None,
        }
    }
}

/// A specialized `Result` type for schema operations, returning the crate's
/// [`SchemaError`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, SchemaError>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(SchemaError: Send, Sync, Debug);

    #[test]
    fn cycle_is_rendered_as_path() {
        let error = SchemaError::CyclicCompoundReference {
            cycle: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };

        assert_eq!(
            error.to_string(),
            "compound metrics form a cycle: a -> b -> a"
        );
        assert_eq!(error.metric_name(), Some("a"));
    }

    #[test]
    fn ordering_errors_have_no_single_metric() {
        let error = SchemaError::incomplete("display", "missing 'reads'");

        assert_eq!(error.metric_name(), None);
        assert_eq!(
            error.to_string(),
            "display order is incomplete: missing 'reads'"
        );
    }
}
