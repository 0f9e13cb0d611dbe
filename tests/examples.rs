// SPDX-License-Identifier: MPL-2.0

//! End-to-end resolutions against a small in-memory index, covering the classic
//! decision-making and conflict-resolution scenarios from the PubGrub literature
//! (<https://github.com/dart-lang/pub/blob/master/doc/solver.md>), translated to PEP 440
//! versions and extras-aware package identifiers.

use std::io::Write;
use std::str::FromStr;

use log::LevelFilter;

use pubgrub::{resolve, Map, OfflineDependencyProvider, PackageId, Ranges, Version};

type PepVS = Ranges<Version>;

fn init_log() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Trace)
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .is_test(true)
        .try_init();
}

fn v(s: &str) -> Version {
    Version::from_str(s).unwrap()
}

/// A caret requirement `^a.0.0`, i.e. `>=a.0.0, <(a+1).0.0`.
fn caret(major: u64) -> PepVS {
    Ranges::between(v(&format!("{major}.0.0")), v(&format!("{}.0.0", major + 1)))
}

#[test]
/// <https://github.com/dart-lang/pub/blob/master/doc/solver.md#no-conflicts>
fn no_conflict() {
    init_log();
    let mut dependency_provider = OfflineDependencyProvider::<&str, PepVS>::new();
    dependency_provider.add_dependencies("root", v("1.0.0"), [("foo", caret(1))]);
    dependency_provider.add_dependencies("foo", v("1.0.0"), [("bar", caret(1))]);
    dependency_provider.add_dependencies("bar", v("1.0.0"), []);
    dependency_provider.add_dependencies("bar", v("2.0.0"), []);

    let solution = resolve(&dependency_provider, "root", v("1.0.0")).unwrap();

    let mut expected = Map::default();
    expected.insert("root", v("1.0.0"));
    expected.insert("foo", v("1.0.0"));
    expected.insert("bar", v("1.0.0"));
    assert_eq!(solution, expected);
}

#[test]
/// <https://github.com/dart-lang/pub/blob/master/doc/solver.md#avoiding-conflict-during-decision-making>
fn avoiding_conflict_during_decision_making() {
    init_log();
    let mut dependency_provider = OfflineDependencyProvider::<&str, PepVS>::new();
    dependency_provider.add_dependencies(
        "root",
        v("1.0.0"),
        [("foo", caret(1)), ("bar", caret(1))],
    );
    dependency_provider.add_dependencies("foo", v("1.1.0"), [("bar", caret(2))]);
    dependency_provider.add_dependencies("foo", v("1.0.0"), []);
    dependency_provider.add_dependencies("bar", v("1.0.0"), []);
    dependency_provider.add_dependencies("bar", v("1.1.0"), []);
    dependency_provider.add_dependencies("bar", v("2.0.0"), []);

    let solution = resolve(&dependency_provider, "root", v("1.0.0")).unwrap();

    let mut expected = Map::default();
    expected.insert("root", v("1.0.0"));
    expected.insert("foo", v("1.0.0"));
    expected.insert("bar", v("1.1.0"));
    assert_eq!(solution, expected);
}

#[test]
/// <https://github.com/dart-lang/pub/blob/master/doc/solver.md#performing-conflict-resolution>
fn conflict_resolution() {
    init_log();
    let mut dependency_provider = OfflineDependencyProvider::<&str, PepVS>::new();
    dependency_provider.add_dependencies("root", v("1.0.0"), [("foo", Ranges::higher_than(v("1.0.0")))]);
    dependency_provider.add_dependencies("foo", v("2.0.0"), [("bar", caret(1))]);
    dependency_provider.add_dependencies("foo", v("1.0.0"), []);
    dependency_provider.add_dependencies("bar", v("1.0.0"), [("foo", caret(1))]);

    let solution = resolve(&dependency_provider, "root", v("1.0.0")).unwrap();

    let mut expected = Map::default();
    expected.insert("root", v("1.0.0"));
    expected.insert("foo", v("1.0.0"));
    assert_eq!(solution, expected);
}

#[test]
/// <https://github.com/dart-lang/pub/blob/master/doc/solver.md#conflict-resolution-with-a-partial-satisfier>
fn conflict_with_partial_satisfier() {
    init_log();
    let mut dependency_provider = OfflineDependencyProvider::<&str, PepVS>::new();
    // root depends on foo ^1.0.0 and target ^2.0.0
    dependency_provider.add_dependencies(
        "root",
        v("1.0.0"),
        [("foo", caret(1)), ("target", caret(2))],
    );
    // foo 1.1.0 depends on left ^1.0.0 and right ^1.0.0
    dependency_provider.add_dependencies(
        "foo",
        v("1.1.0"),
        [("left", caret(1)), ("right", caret(1))],
    );
    dependency_provider.add_dependencies("foo", v("1.0.0"), []);
    // left 1.0.0 depends on shared >=1.0.0
    dependency_provider.add_dependencies(
        "left",
        v("1.0.0"),
        [("shared", Ranges::higher_than(v("1.0.0")))],
    );
    // right 1.0.0 depends on shared <2.0.0
    dependency_provider.add_dependencies(
        "right",
        v("1.0.0"),
        [("shared", Ranges::strictly_lower_than(v("2.0.0")))],
    );
    dependency_provider.add_dependencies("shared", v("2.0.0"), []);
    // shared 1.0.0 depends on target ^1.0.0
    dependency_provider.add_dependencies("shared", v("1.0.0"), [("target", caret(1))]);
    dependency_provider.add_dependencies("target", v("2.0.0"), []);
    dependency_provider.add_dependencies("target", v("1.0.0"), []);

    let solution = resolve(&dependency_provider, "root", v("1.0.0")).unwrap();

    let mut expected = Map::default();
    expected.insert("root", v("1.0.0"));
    expected.insert("foo", v("1.0.0"));
    expected.insert("target", v("2.0.0"));
    assert_eq!(solution, expected);
}

#[test]
/// a0 depends on b and c; b0 -> d0, b1 -> d1 (unavailable), c0 has no dep, c1 -> d2
/// (unavailable). The only full assignment is a0, b0, c0, d0.
fn double_choices() {
    init_log();
    let mut dependency_provider = OfflineDependencyProvider::<&str, PepVS>::new();
    dependency_provider.add_dependencies(
        "a",
        v("0.0.0"),
        [("b", Ranges::full()), ("c", Ranges::full())],
    );
    dependency_provider.add_dependencies("b", v("0.0.0"), [("d", Ranges::singleton(v("0.0.0")))]);
    dependency_provider.add_dependencies("b", v("1.0.0"), [("d", Ranges::singleton(v("1.0.0")))]);
    dependency_provider.add_dependencies("c", v("0.0.0"), []);
    dependency_provider.add_dependencies("c", v("1.0.0"), [("d", Ranges::singleton(v("2.0.0")))]);
    dependency_provider.add_dependencies("d", v("0.0.0"), []);

    let solution = resolve(&dependency_provider, "a", v("0.0.0")).unwrap();

    let mut expected = Map::default();
    expected.insert("a", v("0.0.0"));
    expected.insert("b", v("0.0.0"));
    expected.insert("c", v("0.0.0"));
    expected.insert("d", v("0.0.0"));
    assert_eq!(solution, expected);
}

#[test]
/// `foo[bar]` pulls in both bare `foo` (same version) and `bar`'s own extra dependency,
/// exercising extras-as-distinct-packages end to end through the public solver entry point.
fn resolves_an_extra_alongside_its_base_package() {
    init_log();
    let mut dependency_provider = OfflineDependencyProvider::<PackageId, PepVS>::new();

    let root = PackageId::new("root");
    let foo = PackageId::new("foo");
    let foo_extra = PackageId::with_extras("foo", ["speedups".to_string()]);
    let accel = PackageId::new("foo-accel");

    dependency_provider.add_dependencies(root.clone(), v("1.0.0"), [(foo_extra.clone(), Ranges::full())]);
    dependency_provider.add_dependencies(foo.clone(), v("1.0.0"), []);
    dependency_provider.add_dependencies(
        foo_extra.clone(),
        v("1.0.0"),
        [
            (foo.clone(), Ranges::singleton(v("1.0.0"))),
            (accel.clone(), Ranges::full()),
        ],
    );
    dependency_provider.add_dependencies(accel.clone(), v("1.0.0"), []);

    let solution = resolve(&dependency_provider, root, v("1.0.0")).unwrap();

    assert_eq!(solution.get(&foo), Some(&v("1.0.0")));
    assert_eq!(solution.get(&foo_extra), Some(&v("1.0.0")));
    assert_eq!(solution.get(&accel), Some(&v("1.0.0")));
}
