use foldhash::{HashSet, HashSetExt};
use syn::Path;

use crate::compiled::CompiledSchema;
use crate::{Result, SchemaError};

/// The hooks that exist regardless of the schema contents.
pub(crate) const LIFECYCLE_HOOKS: [&str; 3] = ["publish", "clear", "dump"];

/// User-supplied replacements for hook bodies, keyed by hook.
///
/// A key is either a base metric name or one of `publish`, `clear` and `dump`. The target
/// is a path to a function the generated hook delegates to:
///
/// * counter metric: `fn()`
/// * sum or max metric: `fn(u64)`
/// * `publish` and `clear`: `fn(&mut Aggregator)`
/// * `dump`: `fn(&Aggregator)`
///
/// The `dump` override applies in every instrumentation mode. All others only replace the
/// empty body of a disabled hook.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    entries: Vec<(String, Path)>,
}

impl Overrides {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an override. Validation happens when the artifact is generated.
    #[must_use]
    pub fn with(mut self, hook: impl Into<String>, target: Path) -> Self {
        self.insert(hook, target);
        self
    }

    pub fn insert(&mut self, hook: impl Into<String>, target: Path) {
        self.entries.push((hook.into(), target));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .map(|(hook, target)| (hook.as_str(), target))
    }

    pub(crate) fn get(&self, hook: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find_map(|(key, target)| (key == hook).then_some(target))
    }

    /// Every key must name a hook the schema produces, at most once.
    pub(crate) fn validate(&self, compiled: &CompiledSchema) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.entries.len());

        for (hook, _) in &self.entries {
            let known = LIFECYCLE_HOOKS.contains(&hook.as_str())
                || compiled.storage_order().any(|name| name == hook);

            if !known {
                return Err(SchemaError::InvalidOverride { hook: hook.clone() });
            }

            if !seen.insert(hook.as_str()) {
                return Err(SchemaError::duplicate(hook.as_str(), "overrides"));
            }
        }

        Ok(())
    }
}
