// SPDX-License-Identifier: MPL-2.0

//! Package identifiers that carry a (possibly empty) set of requested extras, e.g. `foo[bar]`.
//!
//! Extras are modeled as distinct packages rather than as a field the solver special-cases:
//! `foo` and `foo[bar]` are different [PackageId]s, related only through the dependencies a
//! [DependencyProvider](crate::DependencyProvider) attaches to them. A provider that wants
//! `foo[bar]` to pull in both `foo` itself and `bar`'s extra requirements expresses that the
//! same way it expresses any other dependency edge, by having `foo[bar]`'s dependency list
//! include `foo` at a matching version plus whatever `bar` needs. The solver then treats
//! `foo` and `foo[bar]` as ordinary, independently-decided packages; nothing in [Term](crate::Term)
//! or the incompatibility machinery needs to know extras exist.
//!
//! This means two separate requirements on different extras of the same package, say `foo[a]`
//! from one dependent and `foo[b]` from another, are tracked as two independently-decided
//! `PackageId`s rather than being folded into one `relation`/`intersect` check inside the
//! solver: each pulls in bare `foo` through its own dependency edge, and ordinary conflict
//! resolution over bare `foo`'s version already makes the two converge on a single version of
//! it. [PackageId::union_extras] is not part of that mechanism; it is a construction-time
//! convenience for a `DependencyProvider` that would rather collapse `foo[a]` and `foo[b]`
//! into one `foo[a,b]` node before the solver ever sees them (so the solver only ever decides
//! one package per distinct extras combination actually reachable, instead of one per requesting
//! dependent). See `DESIGN.md` for why the solver-internal relation-override described for
//! extras elsewhere is unreachable under this crate's generic-package architecture.

use std::collections::BTreeSet;
use std::fmt;

/// A package name together with the extras requested of it.
///
/// Two `PackageId`s are equal iff both the name and the extras set match; `foo` and `foo[bar]`
/// compare unequal and are tracked as separate packages by the solver.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct PackageId {
    name: String,
    extras: BTreeSet<String>,
}

impl PackageId {
    /// A package with no extras requested.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extras: BTreeSet::new(),
        }
    }

    /// A package with the given extras requested. The extras are stored sorted, so
    /// construction order does not affect equality.
    pub fn with_extras(name: impl Into<String>, extras: impl IntoIterator<Item = String>) -> Self {
        Self {
            name: name.into(),
            extras: extras.into_iter().collect(),
        }
    }

    /// The canonical package name, ignoring extras.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The requested extras, in sorted order.
    pub fn extras(&self) -> impl Iterator<Item = &str> {
        self.extras.iter().map(String::as_str)
    }

    /// `true` if this id requests no extras.
    pub fn is_bare(&self) -> bool {
        self.extras.is_empty()
    }

    /// The same name with its extras dropped, i.e. what this package depends on unconditionally.
    pub fn bare(&self) -> Self {
        Self::new(self.name.clone())
    }

    /// A `PackageId` for the same name requesting the union of `self`'s and `other`'s extras.
    ///
    /// Selecting extras `{a}` and extras `{a, b}` of a package jointly requires `{a, b}`. This is
    /// a construction-time helper for a [DependencyProvider](crate::DependencyProvider) that
    /// wants to collapse two differently-extra'd requirements on the same package into a single
    /// node before registering dependencies, rather than letting the solver decide `foo[a]` and
    /// `foo[b]` as two separate packages; the solver itself never calls this (see the module
    /// docs).
    pub fn union_extras(&self, other: &Self) -> Self {
        debug_assert_eq!(self.name, other.name, "union_extras across different packages");
        Self {
            name: self.name.clone(),
            extras: self.extras.union(&other.extras).cloned().collect(),
        }
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.extras.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}[{}]", self.name, self.extras().collect::<Vec<_>>().join(","))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::Ranges;
    use crate::solver::{resolve, OfflineDependencyProvider};

    #[test]
    fn bare_and_extra_variant_are_distinct() {
        let bare = PackageId::new("foo");
        let with_bar = PackageId::with_extras("foo", ["bar".to_string()]);
        assert_ne!(bare, with_bar);
        assert_eq!(bare, with_bar.bare());
    }

    #[test]
    fn extras_are_sorted_and_deduplicated() {
        let a = PackageId::with_extras("foo", ["b".to_string(), "a".to_string()]);
        let b = PackageId::with_extras("foo", ["a".to_string(), "b".to_string(), "a".to_string()]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "foo[a,b]");
    }

    #[test]
    fn union_extras_merges_requested_sets() {
        let a = PackageId::with_extras("foo", ["a".to_string()]);
        let b = PackageId::with_extras("foo", ["b".to_string()]);
        assert_eq!(a.union_extras(&b).to_string(), "foo[a,b]");
    }

    #[test]
    fn provider_can_precollapse_differently_extra_d_requirements_via_union_extras() {
        // Two dependents, `left` and `right`, each need a different extra of `shared`. A
        // provider that would rather the solver decide one `shared[...]` node instead of two
        // pre-merges the requirement with `union_extras` before registering either edge.
        type NumVS = Ranges<u32>;
        let mut provider = OfflineDependencyProvider::<PackageId, NumVS>::new();

        let root = PackageId::new("root");
        let left = PackageId::new("left");
        let right = PackageId::new("right");
        let shared_a = PackageId::with_extras("shared", ["a".to_string()]);
        let shared_b = PackageId::with_extras("shared", ["b".to_string()]);
        let merged = shared_a.union_extras(&shared_b);
        assert_eq!(merged, PackageId::with_extras("shared", ["a".to_string(), "b".to_string()]));

        provider.add_dependencies(root.clone(), 1u32, [(left.clone(), Ranges::full()), (right.clone(), Ranges::full())]);
        provider.add_dependencies(left, 1u32, [(merged.clone(), Ranges::full())]);
        provider.add_dependencies(right, 1u32, [(merged.clone(), Ranges::full())]);
        provider.add_dependencies(merged.clone(), 1u32, []);

        let solution = resolve(&provider, root, 1u32).unwrap();
        assert_eq!(solution.get(&merged), Some(&1u32));
    }

    #[test]
    fn extra_variant_pulls_in_bare_package_and_its_own_deps() {
        type NumVS = Ranges<u32>;
        let mut provider = OfflineDependencyProvider::<PackageId, NumVS>::new();

        let root = PackageId::new("root");
        let foo = PackageId::new("foo");
        let foo_bar = PackageId::with_extras("foo", ["bar".to_string()]);
        let bar_dep = PackageId::new("bar-extra-dep");

        provider.add_dependencies(root.clone(), 1u32, [(foo_bar.clone(), Ranges::full())]);
        provider.add_dependencies(foo.clone(), 1u32, []);
        provider.add_dependencies(
            foo_bar.clone(),
            1u32,
            [(foo.clone(), Ranges::singleton(1u32)), (bar_dep.clone(), Ranges::full())],
        );
        provider.add_dependencies(bar_dep.clone(), 1u32, []);

        let solution = resolve(&provider, root, 1u32).unwrap();
        assert_eq!(solution.get(&foo), Some(&1u32));
        assert_eq!(solution.get(&foo_bar), Some(&1u32));
        assert_eq!(solution.get(&bar_dep), Some(&1u32));
    }
}
