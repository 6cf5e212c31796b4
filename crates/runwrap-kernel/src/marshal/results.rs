//! Results — what a marshalled call hands back.

use runwrap_types::{Outcome, Thing};

/// Ordered mapping of output name to loaded value, plus the raw outcome of
/// the wrapped call.
///
/// An entry holding `None` means the output was requested but the tool
/// chose not to produce it — that is not an error. Populated during output
/// collection and never mutated after the call returns; loaded values are
/// independent copies, not views into the scratch directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Results {
    entries: Vec<(String, Option<Thing>)>,
    raw: Outcome,
}

impl Results {
    pub fn new(raw: Outcome) -> Self {
        Self {
            entries: Vec::new(),
            raw,
        }
    }

    /// Whatever the wrapped call returned.
    pub fn raw(&self) -> &Outcome {
        &self.raw
    }

    /// The loaded value for an output, if the tool produced one.
    pub fn get(&self, name: &str) -> Option<&Thing> {
        self.entry(name).and_then(Option::as_ref)
    }

    /// The entry for an output: `None` if the name was never requested,
    /// `Some(None)` if requested but not produced.
    pub fn entry(&self, name: &str) -> Option<&Option<Thing>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Thing>)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a collected output. A loaded value always wins over an
    /// earlier `None` for the same name (chained marshallers each get a
    /// chance to load an output; whichever codec succeeded is kept).
    pub(crate) fn record(&mut self, name: String, value: Option<Thing>) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => {
                if existing.is_none() {
                    *existing = value;
                }
            }
            None => self.entries.push((name, value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runwrap_types::ExecutionResult;

    fn empty() -> Results {
        Results::new(Outcome::Ran(ExecutionResult::success("")))
    }

    #[test]
    fn absent_vs_unproduced() {
        let mut results = empty();
        results.record("made".into(), Some(Thing::from("x")));
        results.record("skipped".into(), None);

        assert_eq!(results.get("made"), Some(&Thing::from("x")));
        assert_eq!(results.entry("skipped"), Some(&None));
        assert!(results.entry("never").is_none());
    }

    #[test]
    fn loaded_values_beat_none() {
        let mut results = empty();
        results.record("out".into(), None);
        results.record("out".into(), Some(Thing::from("late")));
        assert_eq!(results.get("out"), Some(&Thing::from("late")));

        // but a loaded value is never overwritten
        results.record("out".into(), Some(Thing::from("other")));
        assert_eq!(results.get("out"), Some(&Thing::from("late")));
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn insertion_order_is_kept() {
        let mut results = empty();
        results.record("b".into(), None);
        results.record("a".into(), None);
        let names: Vec<_> = results.names().collect();
        assert_eq!(names, ["b", "a"]);
    }
}
