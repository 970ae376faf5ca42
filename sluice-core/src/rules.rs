//! Propagation rules: renaming values as they cross an edge.
//!
//! A rule set belongs to the receiving node. When a parent finishes, each
//! of its output and parameter slots is looked up here by base name to
//! decide which child slot (if any) receives the value. A base name may
//! map to several targets; the parent's nickname then selects among them,
//! which lets a child receive the same named slot from several parents.

/// Ordered multimap from a parent slot base name to one or more child
/// slot base names.
#[derive(Debug, Clone, Default)]
pub struct PropagationRules {
    entries: Vec<(String, String)>,
}

/// Outcome of resolving a parent slot base name against a rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// No rule mentions the base name; it crosses the edge unchanged.
    Identity,
    /// The selected child slot base name.
    Target(&'a str),
    /// Several targets exist and the parent nickname selects none of
    /// them (or is empty). The transfer for this slot is skipped.
    Unresolved,
}

impl PropagationRules {
    /// Create an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a rule set from `(parent_slot, child_slot)` pairs.
    pub fn from_pairs<P, C>(pairs: impl IntoIterator<Item = (P, C)>) -> Self
    where
        P: Into<String>,
        C: Into<String>,
    {
        let mut rules = Self::new();
        for (parent, child) in pairs {
            rules.add(parent, child);
        }
        rules
    }

    /// Append one mapping. Repeated parent names accumulate targets.
    pub fn add(&mut self, parent: impl Into<String>, child: impl Into<String>) {
        self.entries.push((parent.into(), child.into()));
    }

    /// Append one mapping, builder style.
    #[must_use]
    pub fn with(mut self, parent: impl Into<String>, child: impl Into<String>) -> Self {
        self.add(parent, child);
        self
    }

    /// Check whether any rule mentions the given parent base name.
    #[must_use]
    pub fn mentions(&self, base: &str) -> bool {
        self.entries.iter().any(|(parent, _)| parent == base)
    }

    /// All targets registered for a base name, in insertion order.
    pub fn targets<'a>(&'a self, base: &'a str) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .filter(move |(parent, _)| parent == base)
            .map(|(_, child)| child.as_str())
    }

    /// Check whether the rule set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve the child-side base name for a parent slot.
    ///
    /// With a single target the nickname is irrelevant. With several, the
    /// first target containing the parent's nickname as a substring wins;
    /// an empty nickname selects nothing, so the resolution fails rather
    /// than guessing.
    #[must_use]
    pub fn resolve<'a>(&'a self, base: &'a str, parent_nickname: &str) -> Resolution<'a> {
        let mut targets = self.targets(base);
        let Some(first) = targets.next() else {
            return Resolution::Identity;
        };
        if targets.next().is_none() {
            return Resolution::Target(first);
        }
        if parent_nickname.is_empty() {
            return Resolution::Unresolved;
        }
        self.targets(base)
            .find(|target| target.contains(parent_nickname))
            .map_or(Resolution::Unresolved, Resolution::Target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmentioned_names_cross_unchanged() {
        let rules = PropagationRules::from_pairs([("Numbers", "Array")]);
        assert_eq!(rules.resolve("Other", ""), Resolution::Identity);
    }

    #[test]
    fn single_target_ignores_nickname() {
        let rules = PropagationRules::from_pairs([("Numbers", "Array")]);
        assert_eq!(rules.resolve("Numbers", ""), Resolution::Target("Array"));
        assert_eq!(
            rules.resolve("Numbers", "whatever"),
            Resolution::Target("Array")
        );
    }

    #[test]
    fn nickname_selects_among_multiple_targets() {
        let rules = PropagationRules::from_pairs([
            ("Numbers", "LeftArray"),
            ("Numbers", "RightArray"),
        ]);
        assert_eq!(
            rules.resolve("Numbers", "Right"),
            Resolution::Target("RightArray")
        );
        assert_eq!(
            rules.resolve("Numbers", "Left"),
            Resolution::Target("LeftArray")
        );
    }

    #[test]
    fn empty_nickname_cannot_disambiguate() {
        let rules =
            PropagationRules::from_pairs([("Numbers", "LeftArray"), ("Numbers", "RightArray")]);
        assert_eq!(rules.resolve("Numbers", ""), Resolution::Unresolved);
        assert_eq!(rules.resolve("Numbers", "Centre"), Resolution::Unresolved);
    }

    #[test]
    fn resolution_is_deterministic() {
        // Both targets contain the nickname: insertion order decides,
        // every time.
        let rules = PropagationRules::from_pairs([("N", "gen_a"), ("N", "gen_b")]);
        for _ in 0..10 {
            assert_eq!(rules.resolve("N", "gen"), Resolution::Target("gen_a"));
        }
    }
}
