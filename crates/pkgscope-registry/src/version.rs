//! Package versions and version selection.
//!
//! Wraps the `semver` crate and widens it to the version shapes package feeds
//! actually publish: one to four numeric components (`1.0`, `4.5.0.1`),
//! optional pre-release and build metadata. Ordering follows semantic-version
//! rules, with the fourth "revision" component compared after patch.

use std::cmp::Ordering;
use std::fmt;

use semver::{BuildMetadata, Prerelease};

use crate::client::PackageVersionCandidate;
use crate::error::{RegistryError, Result};

/// A parsed package version.
#[derive(Debug, Clone)]
pub struct PackageVersion {
    base: semver::Version,
    revision: u64,
}

impl PackageVersion {
    pub fn is_prerelease(&self) -> bool {
        !self.base.pre.is_empty()
    }
}

/// Parse a version literal like `13.0.3`, `1.0`, `4.5.0.1` or `2.0.0-beta.1+sha`.
pub fn parse_version(s: &str) -> Result<PackageVersion> {
    let invalid = |detail: String| RegistryError::InvalidVersion {
        version: s.to_string(),
        detail,
    };

    let text = s.trim();
    if text.is_empty() {
        return Err(invalid("empty version".into()));
    }

    let (text, build) = match text.split_once('+') {
        Some((head, meta)) => (head, Some(meta)),
        None => (text, None),
    };
    let (numbers, pre) = match text.split_once('-') {
        Some((head, pre)) => (head, Some(pre)),
        None => (text, None),
    };

    let parts: Vec<&str> = numbers.split('.').collect();
    if parts.len() > 4 {
        return Err(invalid(format!("{} numeric components, at most 4 allowed", parts.len())));
    }
    let mut components = [0u64; 4];
    for (slot, part) in components.iter_mut().zip(&parts) {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid(format!("'{part}' is not a number")));
        }
        *slot = part
            .parse()
            .map_err(|e| invalid(format!("'{part}': {e}")))?;
    }

    if pre == Some("") || build == Some("") {
        return Err(invalid("empty pre-release or build tag".into()));
    }

    let mut base = semver::Version::new(components[0], components[1], components[2]);
    if let Some(pre) = pre {
        base.pre = Prerelease::new(pre).map_err(|e| invalid(e.to_string()))?;
    }
    if let Some(build) = build {
        base.build = BuildMetadata::new(build).map_err(|e| invalid(e.to_string()))?;
    }

    Ok(PackageVersion {
        base,
        revision: components[3],
    })
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.base.major, self.base.minor, self.base.patch, self.revision)
            .cmp(&(other.base.major, other.base.minor, other.base.patch, other.revision))
            // Prerelease orders an empty (release) tag above any pre-release tag.
            .then_with(|| self.base.pre.cmp(&other.base.pre))
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageVersion {}

/// Normalized form: three components, or four when the revision is non-zero;
/// build metadata is dropped.
impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.base.major, self.base.minor, self.base.patch)?;
        if self.revision != 0 {
            write!(f, ".{}", self.revision)?;
        }
        if !self.base.pre.is_empty() {
            write!(f, "-{}", self.base.pre)?;
        }
        Ok(())
    }
}

/// Pick exactly one candidate.
///
/// With no request (or an empty one) the highest version wins. Otherwise the
/// request must parse and match a published version exactly; there is no
/// fallback to latest and no range matching. Candidates whose own version
/// does not parse are ignored.
pub fn select<'a>(
    id: &str,
    candidates: &'a [PackageVersionCandidate],
    requested: Option<&str>,
) -> Result<&'a PackageVersionCandidate> {
    let parsed = candidates
        .iter()
        .filter_map(|c| parse_version(&c.identity.version).ok().map(|v| (v, c)));

    match requested.map(str::trim).filter(|r| !r.is_empty()) {
        None => parsed
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, c)| c)
            .ok_or_else(|| RegistryError::PackageNotFound { id: id.to_string() }),
        Some(req) => {
            let wanted = parse_version(req)?;
            parsed
                .filter(|(v, _)| *v == wanted)
                .map(|(_, c)| c)
                .next()
                .ok_or_else(|| RegistryError::VersionNotFound {
                    id: id.to_string(),
                    version: req.to_string(),
                })
        }
    }
}

/// Sort candidates newest first.
pub fn sort_descending(candidates: &mut [PackageVersionCandidate]) {
    candidates.sort_by(|a, b| {
        let va = parse_version(&a.identity.version).ok();
        let vb = parse_version(&b.identity.version).ok();
        vb.cmp(&va)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::PackageIdentity;

    fn candidates(versions: &[&str]) -> Vec<PackageVersionCandidate> {
        versions
            .iter()
            .map(|v| PackageVersionCandidate::new(PackageIdentity::new("Pkg", *v)))
            .collect()
    }

    fn v(s: &str) -> PackageVersion {
        parse_version(s).unwrap()
    }

    #[test]
    fn parse_short_and_long_forms() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("1"), v("1.0.0.0"));
        assert_eq!(v("4.5.0.1").to_string(), "4.5.0.1");
        assert_eq!(v("2.0.0-beta.1+abc").to_string(), "2.0.0-beta.1");
    }

    #[test]
    fn reject_malformed() {
        for bad in ["", "abc", "1..2", "1.2.3.4.5", "1.x", "1.0.0-", "-1.0"] {
            assert!(parse_version(bad).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn prerelease_sorts_below_release() {
        assert!(v("1.0.0-rc.1") < v("1.0.0"));
        assert!(v("1.0.0-alpha") < v("1.0.0-beta"));
        assert!(v("1.0.0-beta.2") < v("1.0.0-beta.11"));
        assert!(v("1.0.0") < v("1.0.0.1"));
        assert!(v("1.0.0.9") < v("1.0.1"));
    }

    #[test]
    fn select_latest_is_maximal() {
        let c = candidates(&["12.0.1", "13.0.3", "13.0.4-beta1", "9.0.1", "13.0.1"]);
        let picked = select("Pkg", &c, None).unwrap();
        assert_eq!(picked.identity.version, "13.0.4-beta1");
        let max = v(&picked.identity.version);
        assert!(c.iter().all(|x| v(&x.identity.version) <= max));
    }

    #[test]
    fn select_latest_release_beats_prerelease_of_same_version() {
        let c = candidates(&["2.0.0-rc.1", "2.0.0", "1.9.0"]);
        assert_eq!(select("Pkg", &c, None).unwrap().identity.version, "2.0.0");
        assert_eq!(select("Pkg", &c, Some("  ")).unwrap().identity.version, "2.0.0");
    }

    #[test]
    fn select_exact_match() {
        let c = candidates(&["1.0.0", "1.1.0", "2.0.0"]);
        assert_eq!(select("Pkg", &c, Some("1.1")).unwrap().identity.version, "1.1.0");
    }

    #[test]
    fn select_missing_version() {
        let c = candidates(&["1.0.0"]);
        let err = select("Pkg", &c, Some("3.0.0")).unwrap_err();
        assert!(matches!(err, RegistryError::VersionNotFound { .. }));
    }

    #[test]
    fn select_unparsable_never_falls_back() {
        let c = candidates(&["1.0.0"]);
        let err = select("Pkg", &c, Some("latest-ish")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidVersion { .. }));
        assert_eq!(err.kind(), pkgscope_core::ErrorKind::InvalidInput);
    }

    #[test]
    fn sort_newest_first() {
        let mut c = candidates(&["1.0.0", "2.0.0-rc", "2.0.0", "1.5.0"]);
        sort_descending(&mut c);
        let order: Vec<_> = c.iter().map(|x| x.identity.version.as_str()).collect();
        assert_eq!(order, vec!["2.0.0", "2.0.0-rc", "1.5.0", "1.0.0"]);
    }
}
