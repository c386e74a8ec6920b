use foldhash::{HashSet, HashSetExt};
use itertools::Itertools;

use crate::{MetricName, Result, SchemaError};

/// Which of the three orderings a list belongs to. Only used for diagnostics.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Ordering {
    Storage,
    Derivation,
    Display,
}

impl Ordering {
    fn label(self) -> &'static str {
        match self {
            Self::Storage => "storage",
            Self::Derivation => "derivation",
            Self::Display => "display",
        }
    }
}

/// Completes an explicitly authored ordering against the full key set.
///
/// Keys from `all_keys` that `explicit` does not mention are appended in the order they
/// appear in `all_keys`. The result is always a permutation of `all_keys` and identical
/// input always yields identical output.
///
/// In `strict` mode a non-empty `explicit` list must already mention every key.
///
/// # Errors
///
/// * [`SchemaError::DuplicateName`] if `explicit` repeats an entry.
/// * [`SchemaError::IncompleteOrdering`] if `explicit` names a key not in `all_keys`,
///   or omits one in strict mode.
pub fn resolve(
    ordering: Ordering,
    explicit: &[MetricName],
    all_keys: &[&str],
    strict: bool,
) -> Result<Vec<String>> {
    if let Some(repeated) = explicit.iter().duplicates().next() {
        return Err(SchemaError::duplicate(
            repeated.to_string(),
            format!("{} order", ordering.label()),
        ));
    }

    let known = all_keys.iter().copied().collect::<HashSet<_>>();

    if let Some(unknown) = explicit.iter().find(|&name| !known.contains(&**name)) {
        return Err(SchemaError::incomplete(
            ordering.label(),
            format!("'{unknown}' is not a metric this ordering can contain"),
        ));
    }

    let mut listed = HashSet::with_capacity(all_keys.len());
    listed.extend(explicit.iter().map(|name| &**name));

    let missing = all_keys
        .iter()
        .copied()
        .filter(|key| !listed.contains(key))
        .collect::<Vec<_>>();

    if strict && !explicit.is_empty() && !missing.is_empty() {
        return Err(SchemaError::incomplete(
            ordering.label(),
            format!(
                "missing {}",
                missing.iter().map(|key| format!("'{key}'")).join(", ")
            ),
        ));
    }

    let complete = explicit
        .iter()
        .map(ToString::to_string)
        .chain(missing.into_iter().map(str::to_string))
        .collect::<Vec<_>>();

    debug_assert_eq!(
        complete.len(),
        all_keys.len(),
        "explicit entries are unique and known, so completion yields a permutation"
    );

    Ok(complete)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn names(items: &[&'static str]) -> Vec<MetricName> {
        items.iter().copied().map(MetricName::from).collect()
    }

    #[test]
    fn appends_unlisted_keys_in_declaration_order() {
        let all = ["a", "b", "c", "d"];

        let resolved = resolve(Ordering::Display, &names(&["c", "a"]), &all, false).unwrap();

        assert_eq!(resolved, ["c", "a", "b", "d"]);
    }

    #[test]
    fn empty_list_yields_declaration_order() {
        let all = ["x", "y"];

        assert_eq!(
            resolve(Ordering::Storage, &[], &all, false).unwrap(),
            ["x", "y"]
        );
        assert_eq!(
            resolve(Ordering::Storage, &[], &all, true).unwrap(),
            ["x", "y"]
        );
    }

    #[test]
    fn result_is_a_deterministic_permutation() {
        let all = ["one", "two", "three", "four", "five"];
        let explicit = names(&["four", "two"]);

        let first = resolve(Ordering::Derivation, &explicit, &all, false).unwrap();
        let second = resolve(Ordering::Derivation, &explicit, &all, false).unwrap();

        assert_eq!(first, second);

        let mut sorted_result = first.clone();
        sorted_result.sort();
        let mut sorted_keys = all.map(str::to_string).to_vec();
        sorted_keys.sort();

        assert_eq!(sorted_result, sorted_keys);
    }

    #[test]
    fn repeated_entry_is_duplicate_name() {
        let error = resolve(Ordering::Display, &names(&["a", "a"]), &["a"], false).unwrap_err();

        assert_eq!(
            error,
            SchemaError::DuplicateName {
                name: "a".to_string(),
                context: "display order".to_string(),
            }
        );
    }

    #[test]
    fn unknown_entry_is_incomplete_ordering() {
        let error = resolve(Ordering::Storage, &names(&["ghost"]), &["a"], false).unwrap_err();

        assert!(matches!(error, SchemaError::IncompleteOrdering { .. }));
    }

    #[test]
    fn strict_mode_rejects_omissions() {
        let error = resolve(Ordering::Display, &names(&["a"]), &["a", "b", "c"], true).unwrap_err();

        assert_eq!(
            error,
            SchemaError::IncompleteOrdering {
                ordering: "display".to_string(),
                problem: "missing 'b', 'c'".to_string(),
            }
        );
    }
}
