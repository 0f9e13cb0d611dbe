// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Versions of Python packages, following [PEP 440](https://peps.python.org/pep-0440/), plus
//! an escape hatch for versions pinned directly to a VCS reference or URL that PEP 440 does not
//! cover.

use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::str::FromStr;

use thiserror::Error;

/// A release segment followed by an optional pre-release, post-release, and dev-release marker,
/// with an epoch and local version label, as specified by PEP 440, or an opaque version pinned
/// to something PEP 440 cannot order (a VCS commit, a direct URL).
///
/// Two opaque versions are equal exactly when their source strings match; an opaque version is
/// never ordered relative to a PEP 440 version or to a different opaque version (see the
/// `Ord`/`PartialOrd` note below).
#[derive(Debug, Clone, Eq)]
pub enum Version {
    /// A version expressible by PEP 440, e.g. `1.0.0rc1`, `2!3.4.5.post1`.
    Pep440(Pep440Version),
    /// A version that can only be identified by its exact source string, e.g. a git commit
    /// pinned with `@ git+https://example.com/repo@abcdef1`.
    Opaque(String),
}

/// The parsed components of a PEP 440 version.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Default)]
pub struct Pep440Version {
    epoch: u64,
    release: Vec<u64>,
    pre: Option<(PreTag, u64)>,
    post: Option<u64>,
    dev: Option<u64>,
    /// Local version label (the part after `+`). Carried for display and equality, but never
    /// consulted for ordering, per PEP 440 ("Local version identifiers MUST NOT be used... when
    /// checking for equality of versions... used only when comparing versions for exact
    /// equality").
    local: Vec<LocalSegment>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
enum PreTag {
    A,
    B,
    Rc,
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
enum LocalSegment {
    Numeric(u64),
    Alpha(String),
}

impl PartialOrd for LocalSegment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LocalSegment {
    /// Numeric segments sort after alphanumeric ones of the same index, and are compared
    /// numerically; alphanumeric segments are compared lexically. This mirrors the local version
    /// label ordering from PEP 440's `_cmpkey`.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Numeric(a), Self::Numeric(b)) => a.cmp(b),
            (Self::Alpha(a), Self::Alpha(b)) => a.cmp(b),
            (Self::Numeric(_), Self::Alpha(_)) => Ordering::Greater,
            (Self::Alpha(_), Self::Numeric(_)) => Ordering::Less,
        }
    }
}

/// Error parsing a [`Pep440Version`] from a string.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum VersionParseError {
    /// The string was empty or contained no release segment at all.
    #[error("version string {0:?} has no release segment")]
    MissingRelease(String),
    /// A numeric segment (epoch, release component, pre/post/dev number) could not be parsed.
    #[error("invalid numeric segment {0:?} in version {1:?}")]
    InvalidNumber(String, String),
    /// A pre-release tag was not one of the recognized spellings (a/alpha, b/beta, rc/c/pre/preview).
    #[error("unrecognized pre-release tag {0:?} in version {1:?}")]
    UnknownPreReleaseTag(String, String),
}

impl Pep440Version {
    /// Parses the release segment, e.g. `release` in `[N!]N(.N)*[{a|b|rc}N][.postN][.devN][+local]`.
    fn parse_release(s: &str) -> Result<Vec<u64>, VersionParseError> {
        if s.is_empty() {
            return Err(VersionParseError::MissingRelease(s.to_string()));
        }
        s.split('.')
            .map(|part| {
                part.parse()
                    .map_err(|_| VersionParseError::InvalidNumber(part.to_string(), s.to_string()))
            })
            .collect()
    }

    /// The lowest version representable, `0`.
    pub fn zero() -> Self {
        Self {
            release: vec![0],
            ..Default::default()
        }
    }

    /// True if this version has a pre-release segment (`aN`, `bN`, or `rcN`).
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }
}

impl FromStr for Pep440Version {
    type Err = VersionParseError;

    /// Hand-written, regex-free parser for the normalized subset of PEP 440's grammar: case is
    /// folded, leading `v` is dropped, separators (`.`, `-`, `_`) between a release segment and a
    /// pre/post/dev marker are all accepted, as the spec's normalization rules require.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let original = input.to_string();
        let s = input.trim().to_ascii_lowercase();
        let s = s.strip_prefix('v').unwrap_or(&s);

        let (epoch_str, rest) = match s.split_once('!') {
            Some((epoch, rest)) => (Some(epoch), rest),
            None => (None, s),
        };
        let epoch = match epoch_str {
            Some(e) => e
                .parse()
                .map_err(|_| VersionParseError::InvalidNumber(e.to_string(), original.clone()))?,
            None => 0,
        };

        let mut rest = rest;
        let local = if let Some((before, local)) = rest.split_once('+') {
            rest = before;
            Self::parse_local(local)
        } else {
            Vec::new()
        };

        let dev_re = find_marker(rest, "dev");
        let (rest, dev) = match dev_re {
            Some((before, num)) => (before, Some(num?)),
            None => (rest, None),
        };

        let post_re = find_post_marker(rest);
        let (rest, post) = match post_re {
            Some((before, num)) => (before, Some(num?)),
            None => (rest, None),
        };

        let pre_re = find_pre_marker(rest, &original);
        let (rest, pre) = match pre_re {
            Some((before, tag, num)) => (before, Some((tag, num?))),
            None => (rest, None),
        };

        let release_str = rest.trim_matches(|c| c == '.' || c == '-' || c == '_');
        let release = Self::parse_release(release_str)?;

        Ok(Self {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }
}

impl Pep440Version {
    fn parse_local(s: &str) -> Vec<LocalSegment> {
        s.split(|c: char| c == '.' || c == '-' || c == '_')
            .filter(|part| !part.is_empty())
            .map(|part| match part.parse::<u64>() {
                Ok(n) => LocalSegment::Numeric(n),
                Err(_) => LocalSegment::Alpha(part.to_string()),
            })
            .collect()
    }
}

/// Finds a `.devN` marker anywhere after the release, returning the prefix and the parsed number.
fn find_marker<'a>(
    s: &'a str,
    tag: &str,
) -> Option<(&'a str, Result<u64, VersionParseError>)> {
    let idx = s.find(tag)?;
    let before = s[..idx].trim_end_matches(|c| c == '.' || c == '-' || c == '_');
    let digits = s[idx + tag.len()..].trim_start_matches(|c| c == '.' || c == '-' || c == '_');
    let n = if digits.is_empty() {
        Ok(0)
    } else {
        digits
            .parse()
            .map_err(|_| VersionParseError::InvalidNumber(digits.to_string(), s.to_string()))
    };
    Some((before, n))
}

/// Finds a post-release marker: `.postN`, `-N`, or `.rN`.
fn find_post_marker(s: &str) -> Option<(&str, Result<u64, VersionParseError>)> {
    if let Some(found) = find_marker(s, "post") {
        return Some(found);
    }
    find_marker(s, ".r")
}

/// Finds a pre-release marker (`aN`, `bN`, `rcN`, and their long spellings).
fn find_pre_marker<'a>(
    s: &'a str,
    original: &str,
) -> Option<(&'a str, PreTag, Result<u64, VersionParseError>)> {
    const TAGS: &[(&str, PreTag)] = &[
        ("alpha", PreTag::A),
        ("a", PreTag::A),
        ("beta", PreTag::B),
        ("b", PreTag::B),
        ("preview", PreTag::Rc),
        ("pre", PreTag::Rc),
        ("rc", PreTag::Rc),
        ("c", PreTag::Rc),
    ];
    for (spelling, tag) in TAGS {
        if let Some(idx) = s.rfind(spelling) {
            // Only treat this as a pre-release marker if what follows is all digits (or empty),
            // ignoring a single separator between the tag spelling and its number.
            let digits = s[idx + spelling.len()..].trim_start_matches(|c| c == '.' || c == '-' || c == '_');
            if digits.chars().all(|c| c.is_ascii_digit()) && idx > 0 {
                let before = s[..idx].trim_end_matches(|c| c == '.' || c == '-' || c == '_');
                let n = if digits.is_empty() {
                    Ok(0)
                } else {
                    digits.parse().map_err(|_| {
                        VersionParseError::InvalidNumber(digits.to_string(), original.to_string())
                    })
                };
                return Some((before, *tag, n));
            }
        }
    }
    None
}

impl Display for Pep440Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release = self
            .release
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{release}")?;
        if let Some((tag, n)) = &self.pre {
            let tag = match tag {
                PreTag::A => "a",
                PreTag::B => "b",
                PreTag::Rc => "rc",
            };
            write!(f, "{tag}{n}")?;
        }
        if let Some(n) = self.post {
            write!(f, ".post{n}")?;
        }
        if let Some(n) = self.dev {
            write!(f, ".dev{n}")?;
        }
        if !self.local.is_empty() {
            let local = self
                .local
                .iter()
                .map(|seg| match seg {
                    LocalSegment::Numeric(n) => n.to_string(),
                    LocalSegment::Alpha(s) => s.clone(),
                })
                .collect::<Vec<_>>()
                .join(".");
            write!(f, "+{local}")?;
        }
        Ok(())
    }
}

/// Ordering key that strips trailing zeros from the release segment before comparing, so `1.0`
/// and `1.0.0` compare equal as PEP 440's "the release segment is zero padded" rule requires
/// (comparing element-wise with a missing trailing element treated as smaller is equivalent to
/// padding the shorter release with zeros first), and orders pre/dev/post markers so that
/// `1.0.dev1 < 1.0a1 < 1.0b1 < 1.0rc1 < 1.0 < 1.0.post1`.
fn cmp_key(v: &Pep440Version) -> (u64, Vec<u64>, (i8, u64), (bool, u64), (bool, u64)) {
    let mut release = v.release.clone();
    while release.len() > 1 && release.last() == Some(&0) {
        release.pop();
    }
    // A version with neither pre nor dev sorts after prereleases of the same release; one with
    // only dev (no pre) sorts before the corresponding pre-release.
    let pre_key = match &v.pre {
        Some((tag, n)) => (*tag as i8, *n),
        None if v.dev.is_some() => (-1, 0),
        None => (2, 0),
    };
    let post_key = match v.post {
        Some(n) => (true, n),
        None => (false, 0),
    };
    let dev_key = match v.dev {
        Some(n) => (false, n),
        None => (true, u64::MAX),
    };
    (v.epoch, release, pre_key, post_key, dev_key)
}

impl PartialEq for Pep440Version {
    fn eq(&self, other: &Self) -> bool {
        cmp_key(self) == cmp_key(other) && self.local == other.local
    }
}

impl PartialOrd for Pep440Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pep440Version {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_key(self)
            .cmp(&cmp_key(other))
            .then_with(|| self.local.cmp(&other.local))
    }
}

impl Version {
    /// The lowest PEP 440 version, `0`.
    pub fn zero() -> Self {
        Self::Pep440(Pep440Version::zero())
    }

    /// True for pre-releases and dev-releases; always false for an opaque version, since VCS
    /// pins carry no release-channel information.
    pub fn is_prerelease(&self) -> bool {
        match self {
            Self::Pep440(v) => v.is_prerelease(),
            Self::Opaque(_) => false,
        }
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pep440Version::from_str(s).map(Self::Pep440)
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pep440(v) => Display::fmt(v, f),
            Self::Opaque(s) => Display::fmt(s, f),
        }
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Pep440(a), Self::Pep440(b)) => a == b,
            (Self::Opaque(a), Self::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl std::hash::Hash for Version {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Self::Pep440(v) => {
                0u8.hash(state);
                cmp_key(v).hash(state);
            }
            Self::Opaque(s) => {
                1u8.hash(state);
                s.hash(state);
            }
        }
    }
}

/// Two PEP 440 versions order by release precedence as usual. Two opaque versions order by
/// their source string. A PEP 440 version always sorts below an opaque one, so that an
/// `OfflineDependencyProvider` picking "the highest matching version" has a well-defined answer
/// even when a package mixes registry releases and VCS/URL pins; this ordering carries no
/// meaning beyond that. Equality still follows the documented rule: two opaque versions are
/// equal only when their source strings match exactly, and an opaque version never equals a
/// PEP 440 one.
impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Pep440(a), Self::Pep440(b)) => a.cmp(b),
            (Self::Opaque(a), Self::Opaque(b)) => a.cmp(b),
            (Self::Pep440(_), Self::Opaque(_)) => Ordering::Less,
            (Self::Opaque(_), Self::Pep440(_)) => Ordering::Greater,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Pep440Version {
        s.parse().unwrap()
    }

    #[test]
    fn parses_plain_release() {
        assert_eq!(v("1.0.0").to_string(), "1.0.0");
        assert_eq!(v("1.0").to_string(), "1.0");
    }

    #[test]
    fn orders_prerelease_before_release_before_postrelease() {
        assert!(v("1.0.0rc1") < v("1.0.0"));
        assert!(v("1.0.0") < v("1.0.0.post1"));
        assert!(v("1.0.0.post1") < v("1.0.1"));
        assert!(v("1.0.0a1") < v("1.0.0b1"));
        assert!(v("1.0.0b1") < v("1.0.0rc1"));
        assert!(v("1.0.0.dev1") < v("1.0.0a1"));
    }

    #[test]
    fn release_segments_compare_with_trailing_zero_equivalence() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert!(v("1.0") < v("1.1"));
    }

    #[test]
    fn epoch_dominates_release() {
        assert!(v("1!1.0") > v("2.0"));
    }

    #[test]
    fn local_label_is_ignored_for_release_ordering_but_not_equality() {
        assert!(v("1.0+abc") == v("1.0+abc"));
        assert_ne!(v("1.0+abc"), v("1.0+def"));
        // Ordering is still defined because the non-local key is equal and local breaks the tie.
        assert!(v("1.0+abc") < v("1.0+def"));
    }

    #[test]
    fn accepts_alternate_separators_and_case() {
        assert_eq!(v("1.0.0-rc.1"), v("1.0.0RC1"));
        assert_eq!(v("1.0.0_post_1"), v("1.0.0.post1"));
    }

    #[test]
    fn opaque_versions_are_equal_only_by_source_string() {
        let a = Version::Opaque("git+https://example.com/r@abc".to_string());
        let b = Version::Opaque("git+https://example.com/r@abc".to_string());
        let c = Version::Opaque("git+https://example.com/r@def".to_string());
        let pep = Version::zero();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, pep);
        // total order exists (needed to back interval algebra), but a PEP 440 version
        // always sorts below any opaque one; the ordering itself carries no meaning.
        assert!(pep < a);
        assert!(pep < c);
    }
}
