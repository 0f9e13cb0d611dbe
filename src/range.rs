// SPDX-License-Identifier: MPL-2.0

//! Ranges are constraints defining sets of versions, re-exported from the standalone
//! [`version_ranges`] crate so that other solvers can reuse the interval algebra without
//! depending on the rest of this crate.
//!
//! Concretely, those constraints correspond to any set of versions representable as the
//! concatenation, union, and complement of the ranges building blocks.
//!
//! [`Range`] is a single half-open interval (or the union of at most one); [`Ranges`] is the
//! general type, an ordered list of disjoint ranges, and is the type that actually implements
//! [`VersionSet`] since `Range` alone is not closed under union.
//!
//! Those building blocks are:
//!  - [empty()](Range::empty): the empty set
//!  - [full()](Range::full): the set of all possible versions
//!  - [singleton(v)](Range::singleton): the set containing only the version v
//!  - [higher_than(v)](Range::higher_than): the set defined by `v <= versions`
//!  - [strictly_higher_than(v)](Range::strictly_higher_than): the set defined by `v < versions`
//!  - [lower_than(v)](Range::lower_than): the set defined by `versions <= v`
//!  - [strictly_lower_than(v)](Range::strictly_lower_than): the set defined by `versions < v`
//!  - [between(v1, v2)](Range::between): the set defined by `v1 <= versions < v2`

pub use version_ranges::{Range, Ranges};

use crate::version_set::VersionSet;
use std::fmt::{Debug, Display};

impl<V: Debug + Display + Clone + Eq + Ord> VersionSet for Ranges<V> {
    type V = V;

    fn empty() -> Self {
        Ranges::empty()
    }

    fn singleton(v: Self::V) -> Self {
        Ranges::singleton(v)
    }

    fn complement(&self) -> Self {
        Ranges::complement(self)
    }

    fn intersection(&self, other: &Self) -> Self {
        Ranges::intersection(self, other)
    }

    fn contains(&self, v: &Self::V) -> bool {
        Ranges::contains(self, v)
    }

    fn full() -> Self {
        Ranges::full()
    }

    fn union(&self, other: &Self) -> Self {
        Ranges::union(self, other)
    }
}
