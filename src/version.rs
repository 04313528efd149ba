// Author: Dustin Pilgrim
// License: MIT

//! Version numbers and version constraints such as `~> 1.2, != 1.2.5`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^v?(\d+(?:\.\d+)*)(?:-([0-9A-Za-z\-~]+(?:\.[0-9A-Za-z\-~]+)*))?(?:\+([0-9A-Za-z\-~]+(?:\.[0-9A-Za-z\-~]+)*))?$")
        .expect("version pattern is valid")
});

static CONSTRAINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(~>|>=|<=|!=|=|>|<)?\s*(\S+)\s*$").expect("constraint pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("Malformed version: {0}")]
    Malformed(String),
    #[error("Malformed constraint: {0}")]
    MalformedConstraint(String),
}

/// A parsed version. Missing segments read as zero, so `1.2` equals `1.2.0`.
#[derive(Debug, Clone)]
pub struct Version {
    segments: Vec<u64>,
    /// How many segments were written out.
    specified: usize,
    prerelease: String,
    metadata: String,
    original: String,
}

impl Version {
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        let caps = VERSION_RE
            .captures(trimmed)
            .ok_or_else(|| VersionError::Malformed(input.to_string()))?;

        let mut segments = caps[1]
            .split('.')
            .map(|s| s.parse::<u64>().map_err(|_| VersionError::Malformed(input.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        let specified = segments.len();
        while segments.len() < 3 {
            segments.push(0);
        }

        Ok(Self {
            segments,
            specified,
            prerelease: caps.get(2).map_or(String::new(), |m| m.as_str().to_string()),
            metadata: caps.get(3).map_or(String::new(), |m| m.as_str().to_string()),
            original: trimmed.to_string(),
        })
    }

    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    pub fn prerelease(&self) -> &str {
        &self.prerelease
    }

    pub fn metadata(&self) -> &str {
        &self.metadata
    }

    fn segment(&self, i: usize) -> u64 {
        self.segments.get(i).copied().unwrap_or(0)
    }

    fn core_eq(&self, other: &Version) -> bool {
        let len = self.segments.len().max(other.segments.len());
        (0..len).all(|i| self.segment(i) == other.segment(i))
    }
}

fn compare_prerelease(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(ln), Ok(rn)) => ln.cmp(&rn),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => l.cmp(r),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            match self.segment(i).cmp(&other.segment(i)) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        compare_prerelease(&self.prerelease, &other.prerelease)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Build metadata does not take part in equality.
impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core: Vec<String> = self.segments.iter().map(u64::to_string).collect();
        write!(f, "{}", core.join("."))?;
        if !self.prerelease.is_empty() {
            write!(f, "-{}", self.prerelease)?;
        }
        if !self.metadata.is_empty() {
            write!(f, "+{}", self.metadata)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
    Pessimistic,
}

impl Operator {
    fn parse(s: &str) -> Self {
        match s {
            "!=" => Operator::NotEqual,
            ">" => Operator::Greater,
            "<" => Operator::Less,
            ">=" => Operator::GreaterEqual,
            "<=" => Operator::LessEqual,
            "~>" => Operator::Pessimistic,
            _ => Operator::Equal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::Greater => ">",
            Operator::Less => "<",
            Operator::GreaterEqual => ">=",
            Operator::LessEqual => "<=",
            Operator::Pessimistic => "~>",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub op: Operator,
    pub version: Version,
}

// A pre-release only satisfies a constraint that names a pre-release of the same core version.
fn prerelease_check(v: &Version, c: &Version) -> bool {
    match (!v.prerelease.is_empty(), !c.prerelease.is_empty()) {
        (true, true) => v.core_eq(c),
        (true, false) => false,
        _ => true,
    }
}

fn pessimistic(v: &Version, c: &Version) -> bool {
    if !prerelease_check(v, c) || (!c.prerelease.is_empty() && v.prerelease.is_empty()) {
        return false;
    }
    if v < c {
        return false;
    }
    if c.specified > v.specified {
        return false;
    }
    if (0..c.specified.saturating_sub(1)).any(|i| v.segment(i) != c.segment(i)) {
        return false;
    }
    let last = c.segments.len() - 1;
    c.segment(last) <= v.segment(last)
}

impl Constraint {
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let caps = CONSTRAINT_RE
            .captures(input)
            .ok_or_else(|| VersionError::MalformedConstraint(input.to_string()))?;
        let op = Operator::parse(caps.get(1).map_or("", |m| m.as_str()));
        let version =
            Version::parse(&caps[2]).map_err(|_| VersionError::MalformedConstraint(input.to_string()))?;
        Ok(Self { op, version })
    }

    pub fn check(&self, v: &Version) -> bool {
        let c = &self.version;
        match self.op {
            Operator::Equal => v == c,
            Operator::NotEqual => v != c,
            Operator::Greater => prerelease_check(v, c) && v > c,
            Operator::Less => prerelease_check(v, c) && v < c,
            Operator::GreaterEqual => prerelease_check(v, c) && v >= c,
            Operator::LessEqual => prerelease_check(v, c) && v <= c,
            Operator::Pessimistic => pessimistic(v, c),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op.as_str(), self.version.original)
    }
}

/// Comma-separated constraints that must all hold.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraints(Vec<Constraint>);

impl Constraints {
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        input
            .split(',')
            .map(Constraint::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(Constraints)
    }

    pub fn check(&self, v: &Version) -> bool {
        self.0.iter().all(|c| c.check(v))
    }
}

impl FromStr for Constraints {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Constraints::parse(s)
    }
}

impl fmt::Display for Constraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn satisfies(version: &str, constraint: &str) -> bool {
        let v = Version::parse(version).expect("valid version");
        Constraints::parse(constraint).expect("valid constraint").check(&v)
    }

    #[test]
    fn test_parse_versions() {
        let v = Version::parse("v1.2").expect("valid version");
        assert_eq!(v.segments(), &[1, 2, 0]);
        assert_eq!(v.to_string(), "1.2.0");

        let v = Version::parse("1.0.0-beta.2+build.5").expect("valid version");
        assert_eq!(v.prerelease(), "beta.2");
        assert_eq!(v.metadata(), "build.5");

        assert!(Version::parse("development").is_err());
        assert!(Version::parse("1.x").is_err());
        assert!(Version::parse("").is_err());
    }

    #[test]
    fn test_ordering() {
        let parse = |s: &str| Version::parse(s).expect("valid version");
        assert!(parse("1.10.0") > parse("1.9.9"));
        assert!(parse("1.0.0") > parse("1.0.0-rc.1"));
        assert!(parse("1.0.0-rc.2") > parse("1.0.0-rc.1"));
        assert!(parse("1.0.0-beta") > parse("1.0.0-2"));
        assert_eq!(parse("1.0"), parse("1.0.0+meta"));
    }

    #[test]
    fn test_comparison_operators() {
        assert!(satisfies("1.0.0", "1.0.0"));
        assert!(satisfies("1.0.0", "= 1.0"));
        assert!(satisfies("1.0.1", "!= 1.0.0"));
        assert!(satisfies("1.2.0", "> 1.1, < 2"));
        assert!(!satisfies("2.0.0", ">= 1.0, < 2.0"));
        assert!(satisfies("2.0.0", "<= 2.0.0"));
    }

    #[test]
    fn test_pessimistic_operator() {
        assert!(satisfies("1.0.0", "~> 1.0"));
        assert!(satisfies("1.9.3", "~> 1.0"));
        assert!(!satisfies("2.0.0", "~> 1.0"));

        assert!(satisfies("1.2.5", "~> 1.2.3"));
        assert!(!satisfies("1.3.0", "~> 1.2.3"));
        assert!(!satisfies("1.2.2", "~> 1.2.3"));

        assert!(satisfies("1.5.0", "~> 1"));
        assert!(!satisfies("0.9.0", "~> 1"));
    }

    #[test]
    fn test_prerelease_rules() {
        assert!(!satisfies("1.2.0-beta", ">= 1.0"));
        assert!(satisfies("1.2.0-beta.2", ">= 1.2.0-beta.1"));
        assert!(!satisfies("1.3.0-beta.2", ">= 1.2.0-beta.1"));
        assert!(satisfies("1.2.0", ">= 1.2.0-beta.1"));
        assert!(!satisfies("1.2.0", "~> 1.2.0-beta.1"));
    }

    #[test]
    fn test_malformed_constraints() {
        assert_eq!(
            Constraints::parse("~> banana"),
            Err(VersionError::MalformedConstraint("~> banana".to_string()))
        );
        assert!(Constraints::parse("").is_err());
        assert!(Constraints::parse(">= 1.0,").is_err());
    }
}
