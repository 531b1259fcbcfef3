//! Rule segments: read-only membership computed from profile attributes
//! and recent events.

use audience_core::{AudienceError, AudienceResult, Profile};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::predicates::{self, LogicalOperator, Predicate, PredicateGroup};
use crate::segment::Segment;
use crate::store::{MemberStore, Members};

/// Serializable description of a rule segment, as loaded by hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub criteria: PredicateGroup,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub struct RuleSegment {
    criteria: Arc<PredicateGroup>,
    store: Arc<dyn MemberStore<Profile>>,
}

impl RuleSegment {
    pub fn new(criteria: PredicateGroup, store: Arc<dyn MemberStore<Profile>>) -> Self {
        Self {
            criteria: Arc::new(criteria),
            store,
        }
    }

    pub fn criteria(&self) -> &PredicateGroup {
        &self.criteria
    }

    pub fn matches(&self, profile: &Profile) -> bool {
        matches_criteria(profile, &self.criteria)
    }
}

impl Segment<Profile> for RuleSegment {
    fn members(&self) -> AudienceResult<Members<Profile>> {
        let criteria = Arc::clone(&self.criteria);
        Ok(Box::new(
            self.store
                .all()?
                .filter(move |profile| matches_criteria(profile, &criteria)),
        ))
    }

    fn include(&self, member: &Profile) -> AudienceResult<bool> {
        Ok(self.matches(member))
    }

    fn add(&self, _member: &Profile) -> AudienceResult<()> {
        Err(AudienceError::UnsupportedOperation { operation: "add" })
    }

    fn remove(&self, _member: &Profile) -> AudienceResult<()> {
        Err(AudienceError::UnsupportedOperation { operation: "remove" })
    }
}

fn matches_criteria(profile: &Profile, group: &PredicateGroup) -> bool {
    match group.operator {
        LogicalOperator::And => {
            group
                .predicates
                .iter()
                .all(|p| evaluate_predicate(profile, p))
                && group.groups.iter().all(|g| matches_criteria(profile, g))
        }
        LogicalOperator::Or => {
            group
                .predicates
                .iter()
                .any(|p| evaluate_predicate(profile, p))
                || group.groups.iter().any(|g| matches_criteria(profile, g))
        }
    }
}

fn evaluate_predicate(profile: &Profile, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Attribute {
            key,
            operator,
            value,
        } => {
            let actual = profile
                .attributes
                .get(key)
                .unwrap_or(&serde_json::Value::Null);
            predicates::compare_values(actual, *operator, value)
        }
        Predicate::Event {
            event_name,
            count_operator,
            count,
            within_days,
        } => {
            let cutoff = event_cutoff(*within_days);
            let event_count = profile
                .events
                .iter()
                .filter(|e| &e.event_name == event_name && e.timestamp >= cutoff)
                .count() as u64;
            predicates::compare_numbers(event_count, *count_operator, *count)
        }
    }
}

/// Start of a trailing window of `within_days`. Windows reaching past the
/// earliest representable instant start there instead.
fn event_cutoff(within_days: u32) -> DateTime<Utc> {
    Duration::try_days(i64::from(within_days))
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::RuleBuilder;
    use crate::store::InMemoryStore;
    use serde_json::json;

    fn store() -> Arc<dyn MemberStore<Profile>> {
        let now = Utc::now();
        Arc::new(InMemoryStore::with_members([
            Profile::new("kid").with_attribute("age", json!(12)),
            Profile::new("adult")
                .with_attribute("age", json!(34))
                .with_event("purchase", now - Duration::days(2))
                .with_event("purchase", now - Duration::days(40)),
            Profile::new("senior").with_attribute("age", json!(70)),
            Profile::new("anon"),
        ]))
    }

    #[test]
    fn test_attribute_rule_filters_store() {
        let criteria = RuleBuilder::new().attribute_gte("age", json!(18)).criteria();
        let segment = RuleSegment::new(criteria, store());

        let ids: Vec<_> = segment.members().unwrap().map(|p| p.id).collect();
        assert_eq!(ids, vec!["adult", "senior"]);
        assert!(!segment.include(&Profile::new("anon")).unwrap());
    }

    #[test]
    fn test_event_window() {
        let recent = RuleBuilder::new().did_event("purchase", 1, 7).criteria();
        let twice = RuleBuilder::new().did_event("purchase", 2, 7).criteria();
        let lapsed = RuleBuilder::new().did_not_do_event("purchase", 30).criteria();

        let store = store();
        let recent = RuleSegment::new(recent, Arc::clone(&store));
        let twice = RuleSegment::new(twice, Arc::clone(&store));
        let lapsed = RuleSegment::new(lapsed, store);

        assert_eq!(recent.size().unwrap(), 1);
        assert_eq!(twice.size().unwrap(), 0);
        assert_eq!(lapsed.size().unwrap(), 3);
    }

    #[test]
    fn test_or_with_nested_group() {
        let criteria = RuleBuilder::new()
            .with_or()
            .attribute_lt("age", json!(13))
            .group(RuleBuilder::new().attribute_gte("age", json!(65)).criteria())
            .criteria();
        let segment = RuleSegment::new(criteria, store());
        let ids: Vec<_> = segment.members().unwrap().map(|p| p.id).collect();
        assert_eq!(ids, vec!["kid", "senior"]);
    }

    #[test]
    fn test_unbounded_event_window_counts_all_events() {
        let never: PredicateGroup = serde_json::from_value(json!({
            "operator": "and",
            "predicates": [{"event": {
                "event_name": "purchase",
                "count_operator": "equals",
                "count": 0,
                "within_days": u32::MAX
            }}]
        }))
        .unwrap();
        let segment = RuleSegment::new(never, store());

        assert!(segment.include(&Profile::new("anon")).unwrap());
        let old_buyer = Profile::new("old").with_event("purchase", Utc::now() - Duration::days(3650));
        assert!(!segment.include(&old_buyer).unwrap());
        assert_eq!(event_cutoff(u32::MAX), DateTime::<Utc>::MIN_UTC);
        assert!(event_cutoff(7) > Utc::now() - Duration::days(8));
    }

    #[test]
    fn test_rule_segments_decline_mutation() {
        let segment = RuleSegment::new(PredicateGroup::empty(LogicalOperator::And), store());
        assert!(matches!(
            segment.add(&Profile::new("kid")),
            Err(AudienceError::UnsupportedOperation { operation: "add" })
        ));
        assert!(matches!(
            segment.remove(&Profile::new("kid")),
            Err(AudienceError::UnsupportedOperation { operation: "remove" })
        ));
        // Empty AND group matches everyone.
        assert_eq!(segment.size().unwrap(), 4);
    }
}
