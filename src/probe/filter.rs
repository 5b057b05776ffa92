//! URL exclusion filtering.

use regex::RegexSet;
use url::Url;

/// Veto hook applied before any probing.
///
/// A matching URL terminates discovery immediately with an `Invalid`
/// verdict; neither source is consulted.
pub trait ExclusionFilter: Send + Sync {
    /// Returns true if `url` must not be probed.
    fn matches(&self, url: &Url) -> bool;
}

/// Regex-based exclusion filter.
///
/// Patterns are matched against the full URL string.
pub struct RegexExclusionFilter {
    patterns: RegexSet,
}

impl RegexExclusionFilter {
    /// Compiles the given patterns into a filter.
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            patterns: RegexSet::new(patterns)?,
        })
    }
}

impl ExclusionFilter for RegexExclusionFilter {
    fn matches(&self, url: &Url) -> bool {
        self.patterns.is_match(url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_url_is_excluded() {
        let filter = RegexExclusionFilter::new([r"^http://ads\.", r"/tracking/"]).unwrap();
        let excluded: Url = "http://ads.example.com/feed".parse().unwrap();
        let allowed: Url = "http://example.com/feed".parse().unwrap();
        assert!(filter.matches(&excluded));
        assert!(!filter.matches(&allowed));
    }

    #[test]
    fn empty_filter_matches_nothing() {
        let filter = RegexExclusionFilter::new(Vec::<&str>::new()).unwrap();
        let url: Url = "http://example.com/".parse().unwrap();
        assert!(!filter.matches(&url));
    }
}
