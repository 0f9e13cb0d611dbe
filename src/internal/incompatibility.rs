// SPDX-License-Identifier: MPL-2.0

//! Core model for the PubGrub algorithm: an incompatibility is a set of terms for different
//! packages that should never be all true at the same time in a single partial solution.

use std::fmt::{self, Debug, Display};

use crate::internal::arena::{Arena, Id};
use crate::internal::small_map::SmallMap;
use crate::package::Package;
use crate::report::{Derived, DerivationTree, External};
use crate::term::{self, Term};
use crate::type_aliases::Map;
use crate::version_set::VersionSet;

/// An id for an `Incompatibility<P, VS, M>` stored in an `Arena<Incompatibility<P, VS, M>>`.
pub(crate) type IncompId<P, VS, M> = Id<Incompatibility<P, VS, M>>;

/// A shorthand for the `IncompId` of a given `DependencyProvider`'s associated types.
pub(crate) type IncompDpId<DP> = IncompId<
    <DP as crate::solver::DependencyProvider>::P,
    <DP as crate::solver::DependencyProvider>::VS,
    <DP as crate::solver::DependencyProvider>::M,
>;

/// An incompatibility is a set of terms for different packages
/// that should never be all true at the same time.
/// A dependency provider cannot download information on a given package,
/// or determine that a given package has no viable version,
/// without expressing that information as an incompatibility.
#[derive(Debug, Clone)]
pub(crate) struct Incompatibility<P: Package, VS: VersionSet, M: Eq + Clone + Debug + Display> {
    package_terms: SmallMap<P, Term<VS>>,
    kind: Kind<P, VS, M>,
}

/// Cause of an incompatibility.
#[derive(Clone, Debug)]
enum Kind<P: Package, VS: VersionSet, M: Eq + Clone + Debug + Display> {
    /// Initial incompatibility aiming at picking the root package for the first decision.
    NotRoot(P, VS::V),
    /// There are no versions in the given range for this package.
    NoVersions(P, VS),
    /// Incompatibility coming from the dependencies of a given package.
    FromDependencyOf(P, VS, P, VS),
    /// The package is unusable for a custom reason specific to the dependency provider,
    /// for example the version is yanked or incompatible with the current environment.
    UnavailableDependencies(P, VS, M),
    /// Derived from two causes. Stores cause ids.
    DerivedFrom(IncompId<P, VS, M>, IncompId<P, VS, M>),
}

/// A Relation describes how a set of terms can be compared to an incompatibility.
#[derive(Eq, PartialEq, Debug)]
pub(crate) enum Relation<P: Package> {
    /// The set of terms satisfies the incompatibility: i.e. the incompatibility "is true".
    Satisfied,
    /// A single term is left unsatisfied, identified by the package name.
    AlmostSatisfied(P),
    /// The set of terms contradicts the incompatibility: i.e. the incompatibility "is false".
    Contradicted(P),
    /// Neither satisfied nor contradicted.
    Inconclusive,
}

impl<P: Package, VS: VersionSet, M: Eq + Clone + Debug + Display> Incompatibility<P, VS, M> {
    /// Create the incompatibility used to initiate unit propagation,
    /// to trigger the very first decision which is to pick the root package version.
    pub(crate) fn not_root(package: P, version: VS::V) -> Self {
        Self {
            package_terms: SmallMap::One([(
                package.clone(),
                Term::Negative(VS::singleton(version.clone())),
            )]),
            kind: Kind::NotRoot(package, version),
        }
    }

    /// Create an incompatibility to remember that a given range does not contain any version.
    pub(crate) fn no_versions(package: P, term: Term<VS>) -> Self {
        let set = match &term {
            Term::Positive(r) => r.clone(),
            Term::Negative(_) => panic!("No version should have a positive term"),
        };
        Self {
            package_terms: SmallMap::One([(package.clone(), term)]),
            kind: Kind::NoVersions(package, set),
        }
    }

    /// Create an incompatibility for a reason outside of pubgrub.
    pub(crate) fn custom_version(package: P, version: VS::V, reason: M) -> Self {
        let set = VS::singleton(version);
        Self {
            package_terms: SmallMap::One([(package.clone(), Term::Positive(set.clone()))]),
            kind: Kind::UnavailableDependencies(package, set, reason),
        }
    }

    /// Build an incompatibility from a given dependency.
    pub(crate) fn from_dependency(package: P, versions: VS, dep: (P, VS)) -> Self {
        let (dep_p, dep_vs) = dep;
        Self {
            package_terms: if package == dep_p {
                SmallMap::One([(
                    package,
                    Term::Positive(versions.clone()).intersection(&Term::Negative(dep_vs.clone())),
                )])
            } else {
                SmallMap::Two([
                    (package.clone(), Term::Positive(versions.clone())),
                    (dep_p.clone(), Term::Negative(dep_vs.clone())),
                ])
            },
            kind: Kind::FromDependencyOf(package, versions, dep_p, dep_vs),
        }
    }

    /// If this incompatibility was built from a package's dependency on another package,
    /// return the two packages in `(dependent, dependency)` order.
    pub(crate) fn as_dependency(&self) -> Option<(&P, &P)> {
        match &self.kind {
            Kind::FromDependencyOf(p, _, dep, _) => Some((p, dep)),
            _ => None,
        }
    }

    /// Merge this dependency incompatibility with another one expressing a dependency on the
    /// same pair of packages, provided they agree on the dependency's range, collapsing
    /// consecutive versions of the dependent into a single incompatibility.
    pub(crate) fn merge_dependents(&self, other: &Self) -> Option<Self> {
        // It is a bug to call this on something that is not a dependency incompatibility.
        let (p1, p2) = self.as_dependency()?;
        if other.as_dependency() != Some((p1, p2)) {
            return None;
        }
        let dep_term_self = self.get(p2)?;
        let dep_term_other = other.get(p2)?;
        if dep_term_self != dep_term_other {
            return None;
        }
        let term_self = self.get(p1)?;
        let term_other = other.get(p1)?;
        let union = term_self.union(term_other);
        let versions = match &union {
            Term::Positive(set) => set.clone(),
            Term::Negative(_) => return None,
        };
        let dep_versions = match dep_term_self {
            Term::Negative(set) => set.clone(),
            Term::Positive(_) => return None,
        };
        Some(Self::from_dependency(
            p1.clone(),
            versions,
            (p2.clone(), dep_versions),
        ))
    }

    /// Prior cause of two incompatibilities using the rule of resolution.
    pub(crate) fn prior_cause(
        incompat: IncompId<P, VS, M>,
        satisfier_cause: IncompId<P, VS, M>,
        package: &P,
        store: &Arena<Self>,
    ) -> Self {
        let kind = Kind::DerivedFrom(incompat, satisfier_cause);
        let mut package_terms = store[incompat].package_terms.clone();
        let t2 = store[satisfier_cause]
            .get(package)
            .expect("package not found in satisfier_cause");
        let t1 = package_terms
            .get_mut(package)
            .expect("package not found in incompat");
        *t1 = t1.union(&t2.negate());
        for (p, t) in store[satisfier_cause].iter() {
            if p != package {
                package_terms.merge(p.clone(), t.clone(), |t1, t2| t1.intersection(t2));
            }
        }
        Self {
            package_terms,
            kind,
        }
    }

    /// Check if an incompatibility should mark the end of the algorithm
    /// because it satisfies the root package.
    pub(crate) fn is_terminal(&self, root_package: &P, root_version: &VS::V) -> bool {
        match self.package_terms.as_slice() {
            [] => true,
            [(package, term)] => package == root_package && term.contains(root_version),
            _ => false,
        }
    }

    /// Get the term related to a given package (if it exists).
    pub(crate) fn get(&self, package: &P) -> Option<&Term<VS>> {
        self.package_terms.get(package)
    }

    /// Iterate over packages.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&P, &Term<VS>)> {
        self.package_terms.iter()
    }

    /// Return the ids of the two incompatibilities this one was derived from, if any.
    pub(crate) fn causes(&self) -> Option<(IncompId<P, VS, M>, IncompId<P, VS, M>)> {
        match self.kind {
            Kind::DerivedFrom(id1, id2) => Some((id1, id2)),
            _ => None,
        }
    }

    /// Check if a partial solution satisfies this incompatibility, contradicts it,
    /// or is inconclusive.
    pub(crate) fn relation(
        &self,
        mut term_for_package: impl FnMut(&P) -> Option<&Term<VS>>,
    ) -> Relation<P> {
        let mut relation = Relation::Satisfied;
        for (package, incompat_term) in self.package_terms.iter() {
            let any = Term::any();
            let relevant_term = term_for_package(package).unwrap_or(&any);
            match incompat_term.relation_with(relevant_term) {
                term::Relation::Satisfied => {}
                term::Relation::Contradicted => return Relation::Contradicted(package.clone()),
                term::Relation::Inconclusive => {
                    if relation == Relation::Satisfied {
                        relation = Relation::AlmostSatisfied(package.clone());
                    } else {
                        relation = Relation::Inconclusive;
                    }
                }
            }
        }
        relation
    }

    /// Build a derivation tree for error reporting, caching already-computed subtrees.
    pub(crate) fn build_derivation_tree(
        id: IncompId<P, VS, M>,
        shared_ids: &std::collections::HashSet<IncompId<P, VS, M>>,
        store: &Arena<Self>,
        precomputed: &Map<IncompId<P, VS, M>, std::sync::Arc<DerivationTree<P, VS>>>,
    ) -> DerivationTree<P, VS> {
        let incompat = &store[id];
        match incompat.causes() {
            Some((id1, id2)) => {
                let cause1 = precomputed.get(&id1).expect("id1 should be precomputed");
                let cause2 = precomputed.get(&id2).expect("id2 should be precomputed");
                let derived = Derived {
                    terms: incompat
                        .package_terms
                        .iter()
                        .map(|(p, t)| (p.clone(), t.clone()))
                        .collect(),
                    shared_id: shared_ids.contains(&id).then(|| id.into_raw() as usize),
                    cause1: Box::new(cause1.as_ref().clone()),
                    cause2: Box::new(cause2.as_ref().clone()),
                };
                DerivationTree::Derived(derived)
            }
            None => DerivationTree::External(match &incompat.kind {
                Kind::NotRoot(package, version) => {
                    External::NotRoot(package.clone(), version.clone())
                }
                Kind::NoVersions(package, set) => External::NoVersions(package.clone(), set.clone()),
                Kind::UnavailableDependencies(package, set, reason) => {
                    External::Unavailable(package.clone(), set.clone(), reason.to_string())
                }
                Kind::FromDependencyOf(p, set_p, dep, set_dep) => External::FromDependencyOf(
                    p.clone(),
                    set_p.clone(),
                    dep.clone(),
                    set_dep.clone(),
                ),
                Kind::DerivedFrom(..) => unreachable!("already handled by the causes() branch"),
            }),
        }
    }
}

impl<P: Package, VS: VersionSet, M: Eq + Clone + Debug + Display> Display
    for Incompatibility<P, VS, M>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.package_terms.as_slice() {
            [] => write!(f, "version solving failed"),
            [(package, term)] => match term {
                Term::Positive(set) => write!(f, "{package} {set} is forbidden"),
                Term::Negative(set) => write!(f, "{package} {set} is mandatory"),
            },
            [(p1, Term::Positive(r1)), (p2, Term::Negative(r2))] => {
                write!(f, "{p1} {r1} depends on {p2} {r2}")
            }
            [(p1, Term::Negative(r1)), (p2, Term::Positive(r2))] => {
                write!(f, "{p2} {r2} depends on {p1} {r1}")
            }
            slice => {
                let str_terms: Vec<_> = slice.iter().map(|(p, t)| format!("{p} {t}")).collect();
                write!(f, "{}", str_terms.join(", "))
            }
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::range::Ranges;
    use proptest::prelude::*;

    pub fn term_strategy() -> impl Strategy<Value = Term<Ranges<u32>>> {
        version_ranges::proptest_strategy().prop_map(Term::Positive)
    }

    proptest! {
        /// After applying the rule of resolution, the pivot package must no longer carry an
        /// unresolved positive-only term: it was either eliminated or replaced by the union of
        /// both sides' terms for that package.
        #[test]
        fn rule_of_resolution(term1 in term_strategy(), term2 in term_strategy()) {
            let mut store = Arena::new();
            let i1 = store.alloc(Incompatibility::no_versions("a", term1.clone()));
            let i2 = store.alloc(Incompatibility::from_dependency(
                "a",
                term1.unwrap_positive().clone(),
                ("b", term2.unwrap_positive().clone()),
            ));
            let prior_cause = Incompatibility::prior_cause(i2, i1, &"a", &store);
            assert!(prior_cause.get(&"a").is_some() || prior_cause.get(&"b").is_some());
        }
    }
}
