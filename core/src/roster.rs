//! Typed roster filters and cache-key derivation.
//!
//! Roster queries may narrow by division and/or department. The filter
//! is a typed object rather than ad-hoc query-string concatenation, so
//! the storage query and the cache key are derived from the same shape
//! and cannot drift apart.

use serde::{Deserialize, Serialize};

/// Optional narrowing of a roster query.
///
/// Each distinct combination of filters is cached independently; the
/// empty filter is the unfiltered roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterFilter {
    /// Restrict to one division.
    pub division: Option<String>,
    /// Restrict to one department.
    pub department: Option<String>,
}

impl RosterFilter {
    /// Filter on a division.
    #[must_use]
    pub fn by_division(division: impl Into<String>) -> Self {
        Self {
            division: Some(division.into()),
            department: None,
        }
    }

    /// Filter on a department.
    #[must_use]
    pub fn by_department(department: impl Into<String>) -> Self {
        Self {
            division: None,
            department: Some(department.into()),
        }
    }

    /// Composite cache key for this event and filter combination.
    ///
    /// Every key for an event starts with the same
    /// `event:{id}:students` prefix (see [`event_key_prefix`]), so a
    /// write for that event can invalidate all filter variants with one
    /// prefix scan. Distinct filter combinations map to distinct keys;
    /// identical arguments always map to the same key. Separator
    /// characters inside filter values are escaped so a value cannot
    /// forge another combination's key.
    #[must_use]
    pub fn cache_key(&self, event_id: i64) -> String {
        let mut key = event_key_prefix(event_id);
        if let Some(division) = &self.division {
            key.push_str(":div:");
            key.push_str(&escape_segment(division));
        }
        if let Some(department) = &self.department {
            key.push_str(":dept:");
            key.push_str(&escape_segment(department));
        }
        key
    }
}

/// Percent-escape the key separator (and the escape character itself)
/// in a filter value, keeping key derivation injective.
fn escape_segment(value: &str) -> String {
    value.replace('%', "%25").replace(':', "%3A")
}

/// Common prefix of every roster cache key for an event.
#[must_use]
pub fn event_key_prefix(event_id: i64) -> String {
    format!("event:{event_id}:students")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfiltered_key_is_the_prefix() {
        assert_eq!(RosterFilter::default().cache_key(5), "event:5:students");
    }

    #[test]
    fn filters_extend_the_key() {
        assert_eq!(
            RosterFilter::by_division("A").cache_key(5),
            "event:5:students:div:A"
        );
        assert_eq!(
            RosterFilter::by_department("CS").cache_key(5),
            "event:5:students:dept:CS"
        );

        let both = RosterFilter {
            division: Some("A".into()),
            department: Some("CS".into()),
        };
        assert_eq!(both.cache_key(5), "event:5:students:div:A:dept:CS");
    }

    #[test]
    fn distinct_combinations_produce_distinct_keys() {
        let keys = [
            RosterFilter::default().cache_key(5),
            RosterFilter::by_division("A").cache_key(5),
            RosterFilter::by_division("B").cache_key(5),
            RosterFilter::by_department("CS").cache_key(5),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in keys.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn separator_in_a_filter_value_cannot_forge_another_key() {
        // Without escaping these two would collide.
        let smuggled = RosterFilter::by_division("A:dept:CS");
        let genuine = RosterFilter {
            division: Some("A".into()),
            department: Some("CS".into()),
        };
        assert_ne!(smuggled.cache_key(5), genuine.cache_key(5));

        // The escape character itself cannot be used to collide either.
        let literal_escape = RosterFilter::by_division("A%3Adept%3ACS");
        assert_ne!(literal_escape.cache_key(5), smuggled.cache_key(5));
        assert_ne!(literal_escape.cache_key(5), genuine.cache_key(5));
    }

    #[test]
    fn key_is_stable_for_identical_arguments() {
        let filter = RosterFilter::by_division("A");
        assert_eq!(filter.cache_key(7), filter.cache_key(7));
    }

    #[test]
    fn all_variants_share_the_event_prefix() {
        let prefix = event_key_prefix(9);
        for filter in [
            RosterFilter::default(),
            RosterFilter::by_division("A"),
            RosterFilter::by_department("IT"),
        ] {
            assert!(filter.cache_key(9).starts_with(&prefix));
        }
        // Keys for another event never share it.
        assert!(!RosterFilter::default().cache_key(10).starts_with(&prefix));
    }
}
