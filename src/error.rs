// SPDX-License-Identifier: MPL-2.0

//! Handling pubgrub errors.

use std::fmt;

use thiserror::Error;

use crate::report::{DefaultStringReporter, DerivationTree, Reporter};
use crate::solver::DependencyProvider;

/// Errors that may occur while solving dependencies.
#[derive(Error, Debug)]
pub enum PubGrubError<DP>
where
    DP: DependencyProvider,
{
    /// There is no solution for this set of dependencies.
    #[error(transparent)]
    NoSolution(#[from] NoSolutionError<DP>),

    /// Error arising when the implementer of
    /// [DependencyProvider] returned an error in the method
    /// [get_dependencies](DependencyProvider::get_dependencies).
    #[error("Retrieving dependencies of {package} {version} failed")]
    ErrorRetrievingDependencies {
        /// Package whose dependencies we want.
        package: DP::P,
        /// Version of the package for which we want the dependencies.
        version: DP::V,
        /// Error raised by the implementer of [DependencyProvider].
        source: DP::Err,
    },

    /// Error arising when the implementer of
    /// [DependencyProvider] returned a dependency on an empty set.
    /// This technically means that the package can not be selected,
    /// but is clearly some kind of mistake.
    #[error("Dependency {dependent} of {package} {version} is the empty set")]
    DependencyOnTheEmptySet {
        /// Package whose dependencies we want.
        package: DP::P,
        /// Version of the package for which we want the dependencies.
        version: DP::V,
        /// The dependent package that requires us to pick from the empty set.
        dependent: DP::P,
    },

    /// Error arising when the implementer of [DependencyProvider]
    /// returned a package that depends on itself.
    #[error("{package} {version} depends on itself")]
    SelfDependency {
        /// The package that depends on itself.
        package: DP::P,
        /// The version of the package that depends on itself.
        version: DP::V,
    },

    /// Error arising when the implementer of [DependencyProvider]
    /// returned an error in the method
    /// [choose_version](DependencyProvider::choose_version).
    #[error("Decision making failed")]
    ErrorChoosingPackageVersion(DP::Err),

    /// Error arising when the implementer of [DependencyProvider]
    /// returned an error in the method
    /// [should_cancel](DependencyProvider::should_cancel).
    #[error("We should cancel")]
    ErrorInShouldCancel(DP::Err),

    /// The resolver gave up after exhausting its retry budget.
    ///
    /// This only occurs when [resolve_with_config](crate::solver::resolve_with_config) is called
    /// with a [SolverConfig](crate::solver::SolverConfig) that sets a `max_tries`, as a guard
    /// against pathological inputs with astronomically large search spaces.
    #[error("Could not find a solution within {max_tries} attempts to pick a package version")]
    MaxTriesExceeded {
        /// The configured limit that was hit.
        max_tries: u32,
    },

    /// Something unexpected happened.
    #[error("{0}")]
    Failure(String),
}

/// A complete tree of reasons why dependency solving failed.
///
/// This type only exists to implement [std::error::Error] for a derivation tree, using the
/// [DefaultStringReporter] to render a message; callers that want a custom report should match
/// on [PubGrubError::NoSolution] and call [Reporter::report_with_formatter] on its contents
/// directly instead of relying on this type's [Display] impl.
pub struct NoSolutionError<DP: DependencyProvider>(pub DerivationTree<DP::P, DP::VS>);

impl<DP: DependencyProvider> fmt::Debug for NoSolutionError<DP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NoSolutionError").field(&self.0).finish()
    }
}

impl<DP: DependencyProvider> fmt::Display for NoSolutionError<DP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", DefaultStringReporter::report(&self.0))
    }
}

impl<DP: DependencyProvider> std::error::Error for NoSolutionError<DP> {}

impl<DP: DependencyProvider> NoSolutionError<DP> {
    /// The derivation tree at the root of this failure.
    pub fn derivation_tree(&self) -> &DerivationTree<DP::P, DP::VS> {
        &self.0
    }
}
