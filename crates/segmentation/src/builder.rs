//! Rule builder: fluent API for constructing rule segment criteria.

use crate::predicates::{ComparisonOperator, LogicalOperator, Predicate, PredicateGroup};
use crate::rule::RuleDefinition;

pub struct RuleBuilder {
    description: Option<String>,
    predicates: Vec<Predicate>,
    groups: Vec<PredicateGroup>,
    operator: LogicalOperator,
    tags: Vec<String>,
}

impl RuleBuilder {
    pub fn new() -> Self {
        Self {
            description: None,
            predicates: Vec::new(),
            groups: Vec::new(),
            operator: LogicalOperator::And,
            tags: Vec::new(),
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_or(mut self) -> Self {
        self.operator = LogicalOperator::Or;
        self
    }

    pub fn attribute(
        mut self,
        key: impl Into<String>,
        operator: ComparisonOperator,
        value: serde_json::Value,
    ) -> Self {
        self.predicates.push(Predicate::Attribute {
            key: key.into(),
            operator,
            value,
        });
        self
    }

    pub fn attribute_equals(self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attribute(key, ComparisonOperator::Equals, value)
    }

    pub fn attribute_gte(self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attribute(key, ComparisonOperator::GreaterThanOrEqual, value)
    }

    pub fn attribute_lt(self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attribute(key, ComparisonOperator::LessThan, value)
    }

    pub fn did_event(
        mut self,
        event_name: impl Into<String>,
        min_count: u64,
        within_days: u32,
    ) -> Self {
        self.predicates.push(Predicate::Event {
            event_name: event_name.into(),
            count_operator: ComparisonOperator::GreaterThanOrEqual,
            count: min_count,
            within_days,
        });
        self
    }

    pub fn did_not_do_event(mut self, event_name: impl Into<String>, within_days: u32) -> Self {
        self.predicates.push(Predicate::Event {
            event_name: event_name.into(),
            count_operator: ComparisonOperator::Equals,
            count: 0,
            within_days,
        });
        self
    }

    pub fn group(mut self, group: PredicateGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn criteria(self) -> PredicateGroup {
        PredicateGroup {
            operator: self.operator,
            predicates: self.predicates,
            groups: self.groups,
        }
    }

    pub fn build(self, name: impl Into<String>) -> RuleDefinition {
        let Self {
            description,
            predicates,
            groups,
            operator,
            tags,
        } = self;
        RuleDefinition {
            name: name.into(),
            description,
            criteria: PredicateGroup {
                operator,
                predicates,
                groups,
            },
            tags,
        }
    }
}

impl Default for RuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}
