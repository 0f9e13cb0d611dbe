// SPDX-License-Identifier: MPL-2.0

use std::str::FromStr;

use pubgrub::{resolve, Map, OfflineDependencyProvider, PubGrubError, Ranges, Version};

type PepVS = Ranges<Version>;

fn v(s: &str) -> Version {
    Version::from_str(s).unwrap()
}

#[test]
fn a_package_with_no_dependencies_resolves_to_itself() {
    let mut dependency_provider = OfflineDependencyProvider::<_, PepVS>::new();
    dependency_provider.add_dependencies("a", v("0.1.0"), []);

    let computed_solution = resolve(&dependency_provider, "a", v("0.1.0")).expect("a solution was not found");

    let mut expected_solution = Map::default();
    expected_solution.insert("a", v("0.1.0"));

    assert_eq!(computed_solution, expected_solution);
}

#[test]
fn dependency_constraints_affect_the_solution() {
    let mut dependency_provider = OfflineDependencyProvider::<_, PepVS>::new();

    dependency_provider.add_dependencies(
        "a",
        v("0.1.0"),
        [("b", Ranges::full()), ("c", Ranges::singleton(v("1.0.0")))],
    );
    dependency_provider.add_dependencies("b", v("0.1.0"), [("c", Ranges::full())]);
    dependency_provider.add_dependencies("c", v("1.0.0"), []);
    dependency_provider.add_dependencies("c", v("2.0.0"), []);

    let computed_solution = resolve(&dependency_provider, "a", v("0.1.0")).expect("a solution was not found");

    let mut expected_solution = Map::default();
    expected_solution.insert("a", v("0.1.0"));
    expected_solution.insert("b", v("0.1.0"));
    expected_solution.insert("c", v("1.0.0"));

    assert_eq!(computed_solution, expected_solution);
}

#[test]
fn a_version_is_rejected_when_its_own_dependency_is_forbidden() {
    let mut dependency_provider = OfflineDependencyProvider::<_, PepVS>::new();

    // "a" depends on "b"; version 0 of "b" depends on nothing, version 1 depends on "c",
    // which "a" forbids outright. The solver must fall back to "b" 0.1.0.
    dependency_provider.add_dependencies(
        "a",
        v("0.1.0"),
        [("b", Ranges::full()), ("c", Ranges::empty())],
    );
    dependency_provider.add_dependencies("b", v("0.1.0"), []);
    dependency_provider.add_dependencies("b", v("0.2.0"), [("c", Ranges::full())]);
    dependency_provider.add_dependencies("c", v("0.1.0"), []);

    let computed_solution = resolve(&dependency_provider, "a", v("0.1.0")).expect("a solution was not found");

    let mut expected_solution = Map::default();
    expected_solution.insert("a", v("0.1.0"));
    expected_solution.insert("b", v("0.1.0"));

    assert_eq!(computed_solution, expected_solution);
}

#[test]
fn same_result_on_repeated_runs() {
    let mut dependency_provider = OfflineDependencyProvider::<_, PepVS>::new();

    dependency_provider.add_dependencies("c", v("0.1.0"), []);
    dependency_provider.add_dependencies("c", v("0.3.0"), []);
    dependency_provider.add_dependencies("b", v("0.1.0"), []);
    dependency_provider.add_dependencies(
        "b",
        v("0.2.0"),
        [("c", Ranges::between(v("0.1.0"), v("0.2.0")))],
    );
    dependency_provider.add_dependencies(
        "a",
        v("0.1.0"),
        [("b", Ranges::full()), ("c", Ranges::full())],
    );

    let name = "a";
    let ver = v("0.1.0");
    let one = resolve(&dependency_provider, name, ver.clone());
    for _ in 0..10 {
        match (&one, &resolve(&dependency_provider, name, ver.clone())) {
            (Ok(l), Ok(r)) => assert_eq!(l, r),
            _ => panic!("not the same result"),
        }
    }
}

#[test]
fn should_always_find_a_satisfier() {
    let mut dependency_provider = OfflineDependencyProvider::<_, PepVS>::new();
    dependency_provider.add_dependencies("a", v("0.1.0"), [("b", Ranges::empty())]);
    assert!(matches!(
        resolve(&dependency_provider, "a", v("0.1.0")),
        Err(PubGrubError::DependencyOnTheEmptySet { .. })
    ));

    dependency_provider.add_dependencies("c", v("0.1.0"), [("a", Ranges::full())]);
    assert!(matches!(
        resolve(&dependency_provider, "c", v("0.1.0")),
        Err(PubGrubError::DependencyOnTheEmptySet { .. })
    ));
}

#[test]
fn cannot_depend_on_self() {
    let mut dependency_provider = OfflineDependencyProvider::<_, PepVS>::new();
    dependency_provider.add_dependencies("a", v("0.1.0"), [("a", Ranges::full())]);
    assert!(matches!(
        resolve(&dependency_provider, "a", v("0.1.0")),
        Err(PubGrubError::SelfDependency { .. })
    ));
}

#[test]
fn max_tries_exceeded_reports_the_configured_limit() {
    use pubgrub::{resolve_with_config, SolverConfig};

    // A long chain that forces one version decision per link: with a tight max_tries the
    // solver must give up instead of running to completion.
    let mut dependency_provider = OfflineDependencyProvider::<_, PepVS>::new();
    for i in 0..20u64 {
        let next = i + 1;
        dependency_provider.add_dependencies(
            format!("pkg{i}"),
            v("1.0.0"),
            [(format!("pkg{next}"), Ranges::full())],
        );
    }
    dependency_provider.add_dependencies(format!("pkg{}", 20u64), v("1.0.0"), []);

    let config = SolverConfig { max_tries: Some(3) };
    let err = resolve_with_config(&dependency_provider, "pkg0".to_string(), v("1.0.0"), &config)
        .unwrap_err();
    assert!(matches!(
        err,
        PubGrubError::MaxTriesExceeded { max_tries: 3 }
    ));
}
