//! Sequence triggers
//!
//! A trigger decides whether a sequence keeps a candidate clone and may
//! record which value sets matched, one flag per set, for rules evaluated
//! later in the pass.

use std::sync::Arc;

use indexmap::IndexMap;
use prefill_core::ast::TemporalRelation;
use prefill_core::{ValueRegistry, ValueSet};

use crate::error::Result;
use crate::field::timestamp::parse_timestamp;
use crate::field::{Field, FieldKind};

/// Value-set membership test on the coded part of a candidate
#[derive(Debug, Clone)]
pub struct ValueSetMatcher {
    value_sets: Vec<Arc<ValueSet>>,
    match_code_system: bool,
    code_field: Option<String>,
}

impl ValueSetMatcher {
    pub fn new(
        value_sets: Vec<Arc<ValueSet>>,
        match_code_system: bool,
        code_field: Option<String>,
    ) -> Self {
        Self {
            value_sets,
            match_code_system,
            code_field,
        }
    }

    /// Resolve set names (or codes) against the registry.
    ///
    /// An unregistered set is a configuration defect and fails with `NotFound`.
    pub fn from_names(
        registry: &ValueRegistry,
        names: &[String],
        match_code_system: bool,
        code_field: Option<String>,
    ) -> Result<Self> {
        let value_sets = names
            .iter()
            .map(|name| registry.lookup(name))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::new(value_sets, match_code_system, code_field))
    }

    pub fn value_sets(&self) -> &[Arc<ValueSet>] {
        &self.value_sets
    }

    /// Coded field holding the candidate's code
    fn coded<'f>(&self, candidate: &'f Field) -> Option<&'f Field> {
        match candidate.kind() {
            FieldKind::Coded(_) => Some(candidate),
            FieldKind::Composite(payload) => match &self.code_field {
                Some(name) => payload.field(name),
                None => payload
                    .fields
                    .iter()
                    .find(|f| matches!(f.kind(), FieldKind::Coded(_))),
            },
            _ => None,
        }
    }

    /// Sets containing the candidate's code or one of its translations
    pub fn matching_sets<'s>(&'s self, candidate: &Field) -> Vec<&'s Arc<ValueSet>> {
        let coded = match self.coded(candidate) {
            Some(coded) => coded,
            None => return vec![],
        };

        let mut codes: Vec<(&str, Option<&str>)> = Vec::new();
        if let FieldKind::Coded(payload) = coded.kind() {
            if let Some(code) = coded.value() {
                codes.push((code, payload.code_system.as_deref()));
            }
            for alias in &payload.aliases {
                codes.push((&alias.code, alias.code_system.as_deref()));
            }
        }

        self.value_sets
            .iter()
            .filter(|set| {
                codes.iter().any(|(code, system)| {
                    if self.match_code_system {
                        system.is_some_and(|system| set.is_member(code, Some(system)))
                    } else {
                        set.is_member(code, None)
                    }
                })
            })
            .collect()
    }

    pub fn accept(&self, candidate: &Field) -> bool {
        !self.matching_sets(candidate).is_empty()
    }
}

/// Acceptance strategy of a sequence
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Keep candidates whose code is in one of the sets
    ValueSet(ValueSetMatcher),
    /// Membership plus an ordering between two interval fields of the candidate
    Composite {
        membership: ValueSetMatcher,
        first: String,
        second: String,
        relation: TemporalRelation,
    },
}

impl Trigger {
    pub fn membership(&self) -> &ValueSetMatcher {
        match self {
            Trigger::ValueSet(matcher) => matcher,
            Trigger::Composite { membership, .. } => membership,
        }
    }

    pub fn accept(&self, candidate: &Field) -> bool {
        match self {
            Trigger::ValueSet(matcher) => matcher.accept(candidate),
            Trigger::Composite {
                membership,
                first,
                second,
                relation,
            } => membership.accept(candidate) && holds(candidate, first, second, *relation),
        }
    }

    /// Flag every set the accepted candidate matched
    pub fn contribute(&self, candidate: &Field, side_channel: &mut IndexMap<String, bool>) {
        for set in self.membership().matching_sets(candidate) {
            side_channel.insert(set.code.clone(), true);
        }
    }

    /// One `false` flag per bound set
    pub fn initial_side_channel(&self) -> IndexMap<String, bool> {
        self.membership()
            .value_sets()
            .iter()
            .map(|set| (set.code.clone(), false))
            .collect()
    }
}

fn holds(candidate: &Field, first: &str, second: &str, relation: TemporalRelation) -> bool {
    let timestamp = |name: &str| {
        let field = match candidate.kind() {
            FieldKind::Composite(payload) => payload.field(name),
            _ => None,
        }?;
        parse_timestamp(field.value()?)
    };

    let (a, b) = match (timestamp(first), timestamp(second)) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            tracing::debug!(
                "Trigger on '{}': cannot compare '{}' and '{}'",
                candidate.name(),
                first,
                second
            );
            return false;
        }
    };

    match relation {
        TemporalRelation::Before => a < b,
        TemporalRelation::OnOrBefore => a <= b,
        TemporalRelation::After => a > b,
        TemporalRelation::OnOrAfter => a >= b,
        TemporalRelation::SameDay => a.date() == b.date(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prefill_core::ast::IntervalPrecision;
    use prefill_core::ValueRegistryBuilder;

    fn registry() -> Arc<ValueRegistry> {
        let mut builder = ValueRegistryBuilder::new();
        builder
            .register("CHLAMYDIA", "Chlamydia (NCHS)", "2.16.1", "", "1")
            .unwrap();
        builder.add_code("CHLAMYDIA", "12345", "Chlamydia", "9.9").unwrap();
        builder
            .register("GONORRHEA", "Gonorrhea (NCHS)", "2.16.2", "", "1")
            .unwrap();
        builder.add_code("GONORRHEA", "55555", "Gonorrhea", "9.9").unwrap();
        builder.freeze()
    }

    fn coded(code: &str, system: Option<&str>) -> Field {
        let mut field = Field::coded("value", "value");
        field.set_value(Some(code.to_string()));
        if let FieldKind::Coded(payload) = field.kind_mut() {
            payload.code_system = system.map(str::to_string);
        }
        field
    }

    #[test]
    fn test_unknown_set_fails() {
        let registry = registry();
        let result = ValueSetMatcher::from_names(&registry, &["Nope".to_string()], false, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_value_set_trigger() {
        let registry = registry();
        let matcher =
            ValueSetMatcher::from_names(&registry, &["Chlamydia (NCHS)".to_string()], false, None)
                .unwrap();
        let trigger = Trigger::ValueSet(matcher);

        assert!(trigger.accept(&coded("12345", None)));
        assert!(!trigger.accept(&coded("99999", Some("9.9"))));
    }

    #[test]
    fn test_code_system_match_required() {
        let registry = registry();
        let matcher =
            ValueSetMatcher::from_names(&registry, &["CHLAMYDIA".to_string()], true, None).unwrap();
        assert!(matcher.accept(&coded("12345", Some("9.9"))));
        assert!(!matcher.accept(&coded("12345", Some("1.1"))));
        assert!(!matcher.accept(&coded("12345", None)));
    }

    #[test]
    fn test_translation_counts_as_code() {
        let registry = registry();
        let matcher =
            ValueSetMatcher::from_names(&registry, &["CHLAMYDIA".to_string()], false, None).unwrap();
        let mut field = coded("local-1", None);
        if let FieldKind::Coded(payload) = field.kind_mut() {
            payload.aliases.push(crate::field::Alias {
                code: "12345".to_string(),
                code_system: Some("9.9".to_string()),
            });
        }
        assert!(matcher.accept(&field));
    }

    #[test]
    fn test_side_channel_flags() {
        let registry = registry();
        let names = vec!["CHLAMYDIA".to_string(), "GONORRHEA".to_string()];
        let trigger =
            Trigger::ValueSet(ValueSetMatcher::from_names(&registry, &names, false, None).unwrap());

        let mut side = trigger.initial_side_channel();
        assert_eq!(side.get("CHLAMYDIA"), Some(&false));

        trigger.contribute(&coded("55555", None), &mut side);
        assert_eq!(side.get("CHLAMYDIA"), Some(&false));
        assert_eq!(side.get("GONORRHEA"), Some(&true));
    }

    #[test]
    fn test_composite_trigger_checks_relation() {
        let registry = registry();
        let membership =
            ValueSetMatcher::from_names(&registry, &["CHLAMYDIA".to_string()], false, Some("code".into()))
                .unwrap();
        let trigger = Trigger::Composite {
            membership,
            first: "onset".to_string(),
            second: "diagnosed".to_string(),
            relation: TemporalRelation::OnOrBefore,
        };

        let candidate = |onset: &str, diagnosed: &str| {
            let mut onset_field = Field::interval("onset", "x", IntervalPrecision::Date);
            onset_field.set_value(Some(onset.to_string()));
            let mut diagnosed_field = Field::interval("diagnosed", "y", IntervalPrecision::Date);
            diagnosed_field.set_value(Some(diagnosed.to_string()));
            let mut code = Field::coded("code", "code");
            code.set_value(Some("12345".to_string()));
            Field::composite("problem", ".", vec![code, onset_field, diagnosed_field])
        };

        assert!(trigger.accept(&candidate("20240101", "20240102")));
        assert!(trigger.accept(&candidate("20240102", "20240102")));
        assert!(!trigger.accept(&candidate("20240103", "20240102")));
        assert!(!trigger.accept(&candidate("", "20240102")));
    }
}
