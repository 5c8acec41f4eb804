use semver::Version;

/// Inclusive supported range for the payload's Python runtime. The bounds
/// compare on major.minor only, so 3.12.7 satisfies a 3.12 upper bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeRange {
    pub min: Version,
    pub max: Option<Version>,
}

impl RuntimeRange {
    pub fn new(min: Version, max: Option<Version>) -> Self {
        Self { min, max }
    }

    /// The range the pinned dependency set has prebuilt artifacts for.
    pub fn supported() -> Self {
        Self::new(Version::new(3, 10, 0), Some(Version::new(3, 12, 0)))
    }

    pub fn contains(&self, version: &Version) -> bool {
        let candidate = (version.major, version.minor);
        if candidate < (self.min.major, self.min.minor) {
            return false;
        }
        match &self.max {
            Some(max) => candidate <= (max.major, max.minor),
            None => true,
        }
    }
}

impl std::fmt::Display for RuntimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.max {
            Some(max) => write!(
                f,
                "{}.{} through {}.{}",
                self.min.major, self.min.minor, max.major, max.minor
            ),
            None => write!(f, "{}.{} or newer", self.min.major, self.min.minor),
        }
    }
}

/// A probed runtime executable whose version passed the gate. Created fresh
/// per run, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeCandidate {
    pub command: String,
    pub version: Version,
}

/// Parses the output of `<candidate> --version` ("Python 3.11.4") into a
/// version. Tolerates two-component versions and pre-release suffixes like
/// "3.13.0rc1" by truncating at the first non-numeric character.
pub fn parse_version_output(output: &str) -> Option<Version> {
    let token = output.split_whitespace().last()?;
    let numeric: String = token
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let mut parts = numeric.trim_end_matches('.').splitn(3, '.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    Some(Version::new(major, minor, patch))
}
