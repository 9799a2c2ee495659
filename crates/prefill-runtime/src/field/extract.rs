//! Extraction protocol
//!
//! `extract` never fails. Anything that cannot be located or read leaves the
//! corresponding part of the payload empty and is logged at debug level.

use std::sync::Arc;

use prefill_core::{Bindings, PathEvaluator};

use super::payload::Alias;
use super::timestamp::apply_precision;
use super::{ExtractionContext, Field, FieldKind};
use crate::sequence;

impl Field {
    /// Extract this field relative to `node`.
    ///
    /// Clears the previous payload first. `bindings` fill `$name`
    /// placeholders in path predicates. Function fields are left untouched;
    /// their value comes from [`DocumentSchema`](crate::DocumentSchema).
    pub fn extract<E: PathEvaluator>(
        &mut self,
        ctx: &ExtractionContext<'_, E>,
        node: E::Node,
        bindings: &Bindings,
    ) {
        self.reset();
        let meta = Arc::clone(&self.meta);

        match &mut self.kind {
            FieldKind::Function(_) => {
                tracing::warn!(
                    "Function field '{}' can only be evaluated by its schema",
                    meta.name
                );
                return;
            }
            FieldKind::Sequence(payload) => {
                let count = sequence::populate(payload, &meta.name, &meta.path, ctx, node, bindings);
                self.value = Some(count.to_string());
                return;
            }
            _ => {}
        }

        let target = match ctx.evaluator.locate(node, &meta.path, bindings) {
            Some(target) => target,
            None => {
                tracing::debug!("Field '{}': nothing at '{}'", meta.name, meta.path);
                return;
            }
        };

        self.read(ctx, target, bindings);

        if self.value.is_none() {
            tracing::debug!(
                "Field '{}': located '{}' but found no value",
                meta.name,
                meta.path
            );
        }
    }

    fn read<E: PathEvaluator>(
        &mut self,
        ctx: &ExtractionContext<'_, E>,
        target: E::Node,
        bindings: &Bindings,
    ) {
        let doc = ctx.evaluator;

        let value = match &mut self.kind {
            FieldKind::Scalar { attribute } => match attribute {
                Some(attribute) => doc.read_attribute(target, attribute),
                None => doc
                    .read_attribute(target, "value")
                    .or_else(|| doc.read_first_level_text(target)),
            },

            FieldKind::Coded(payload) => {
                payload.display_name = doc.read_attribute(target, "displayName");
                payload.code_system = doc.read_attribute(target, "codeSystem");
                payload.code_system_name = doc.read_attribute(target, "codeSystemName");
                payload.aliases = doc
                    .read_first_level_children_by_name(target, "translation")
                    .into_iter()
                    .filter_map(|t| {
                        doc.read_attribute(t, "code").map(|code| Alias {
                            code,
                            code_system: doc.read_attribute(t, "codeSystem"),
                        })
                    })
                    .collect();
                doc.read_attribute(target, "code")
            }

            FieldKind::Identifier(payload) => {
                payload.extension = doc.read_attribute(target, "extension");
                doc.read_attribute(target, "root")
            }

            FieldKind::Interval(payload) => {
                let precision = payload.precision;
                let low = doc.read_attribute(target, "value").or_else(|| {
                    doc.locate(target, "low", bindings)
                        .and_then(|low| doc.read_attribute(low, "value"))
                });
                payload.high_value = doc
                    .locate(target, "high", bindings)
                    .and_then(|high| doc.read_attribute(high, "value"))
                    .map(|v| apply_precision(&v, precision));
                low.map(|v| apply_precision(&v, precision))
            }

            FieldKind::PersonName(payload) => {
                payload.prefix = child_text(doc, target, "prefix");
                payload.given = child_text(doc, target, "given");
                payload.family = child_text(doc, target, "family");
                payload.suffix = child_text(doc, target, "suffix");
                let parts = [&payload.prefix, &payload.given, &payload.family, &payload.suffix];
                join_present(&parts, " ").or_else(|| doc.read_first_level_text(target))
            }

            FieldKind::Address(payload) => {
                payload.street = child_text(doc, target, "streetAddressLine");
                payload.city = child_text(doc, target, "city");
                payload.state = child_text(doc, target, "state");
                payload.postal_code = child_text(doc, target, "postalCode");
                payload.country = child_text(doc, target, "country");
                let parts = [
                    &payload.street,
                    &payload.city,
                    &payload.state,
                    &payload.postal_code,
                    &payload.country,
                ];
                join_present(&parts, ", ")
            }

            FieldKind::CauseOfDeath(payload) => {
                payload.onset_interval = doc
                    .locate(target, &payload.onset_path, bindings)
                    .and_then(|onset| match doc.read_attribute(onset, "value") {
                        Some(value) => match doc.read_attribute(onset, "unit") {
                            Some(unit) => Some(format!("{} {}", value, unit)),
                            None => Some(value),
                        },
                        None => doc.read_first_level_text(onset),
                    });
                doc.locate(target, &payload.cause_path, bindings)
                    .and_then(|cause| {
                        doc.read_first_level_text(cause)
                            .or_else(|| doc.read_attribute(cause, "displayName"))
                            .or_else(|| doc.read_attribute(cause, "code"))
                    })
            }

            FieldKind::AttributeBag(payload) => {
                for (attribute, value) in payload.values.iter_mut() {
                    *value = doc.read_attribute(target, attribute);
                }
                doc.read_first_level_text(target)
            }

            FieldKind::Composite(payload) => {
                payload.class_code = doc.read_attribute(target, "classCode");
                payload.mood_code = doc.read_attribute(target, "moodCode");
                payload.status_code = doc
                    .locate(target, "statusCode", bindings)
                    .and_then(|s| doc.read_attribute(s, "code"));
                payload.reference = doc
                    .locate(target, "reference", bindings)
                    .or_else(|| doc.locate(target, "text/reference", bindings))
                    .and_then(|r| doc.read_attribute(r, "value"));
                for field in &mut payload.fields {
                    field.extract(ctx, target, bindings);
                }
                None
            }

            // Handled before a node is located
            FieldKind::Sequence(_) | FieldKind::Function(_) => None,
        };

        self.value = value;
    }
}

/// Text of the direct children named `name`, joined by spaces
fn child_text<E: PathEvaluator>(doc: &E, node: E::Node, name: &str) -> Option<String> {
    let parts: Vec<String> = doc
        .read_first_level_children_by_name(node, name)
        .into_iter()
        .filter_map(|child| doc.read_first_level_text(child))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn join_present(parts: &[&Option<String>], separator: &str) -> Option<String> {
    let present: Vec<&str> = parts.iter().filter_map(|p| p.as_deref()).collect();
    if present.is_empty() {
        None
    } else {
        Some(present.join(separator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EngineOptions, XmlDocument};
    use prefill_core::ast::IntervalPrecision;
    use prefill_core::ValueRegistry;

    const DOC: &str = r##"<ClinicalDocument>
  <patient>
    <name><prefix>Dr.</prefix><given>Jane</given><given>Q</given><family>Doe</family></name>
    <addr><streetAddressLine>1 Main St</streetAddressLine><city>Springfield</city><state>IL</state><postalCode>62701</postalCode></addr>
    <id root="2.16.840.1.113883.4.1" extension="111-22-3333"/>
    <birthTime value="19800102123000"/>
    <raceCode code="2106-3" displayName="White" codeSystem="2.16.840.1.113883.6.238"/>
  </patient>
  <observation classCode="OBS" moodCode="EVN">
    <code code="12345" codeSystem="9.9" displayName="Chlamydia">
      <translation code="A-1" codeSystem="1.1"/>
    </code>
    <statusCode code="completed"/>
    <text><reference value="#obs1"/></text>
    <effectiveTime><low value="20240101"/><high value="20240105093000"/></effectiveTime>
    <value>Positive</value>
    <entryRelationship><observation><value value="2" unit="h"/></observation></entryRelationship>
  </observation>
</ClinicalDocument>"##;

    fn extract(field: &mut Field, xml: &str) {
        let doc = XmlDocument::parse(xml).unwrap();
        let registry = ValueRegistry::empty();
        let options = EngineOptions::default();
        let ctx = ExtractionContext::new(&doc, &registry, &options);
        let root = doc.root().unwrap();
        field.extract(&ctx, root, &Bindings::new());
    }

    #[test]
    fn test_scalar() {
        let mut field = Field::scalar("result", "observation/value");
        extract(&mut field, DOC);
        assert_eq!(field.value(), Some("Positive"));

        let mut field = Field::scalar_attribute("mood", "observation", "moodCode");
        extract(&mut field, DOC);
        assert_eq!(field.value(), Some("EVN"));
    }

    #[test]
    fn test_coded_with_translation() {
        let mut field = Field::coded("diagnosis", "observation/code");
        extract(&mut field, DOC);
        assert_eq!(field.value(), Some("12345"));
        match field.kind() {
            FieldKind::Coded(p) => {
                assert_eq!(p.code_system.as_deref(), Some("9.9"));
                assert_eq!(p.display_name.as_deref(), Some("Chlamydia"));
                assert_eq!(p.code_system_name, None);
                assert_eq!(p.aliases.len(), 1);
                assert_eq!(p.aliases[0].code, "A-1");
            }
            other => panic!("Unexpected kind {}", other.name()),
        }
    }

    #[test]
    fn test_identifier() {
        let mut field = Field::identifier("ssn", "patient/id");
        extract(&mut field, DOC);
        assert_eq!(field.value(), Some("2.16.840.1.113883.4.1"));
        match field.kind() {
            FieldKind::Identifier(p) => assert_eq!(p.extension.as_deref(), Some("111-22-3333")),
            other => panic!("Unexpected kind {}", other.name()),
        }
    }

    #[test]
    fn test_interval_precision() {
        let mut date = Field::interval("birth", "patient/birthTime", IntervalPrecision::Date);
        extract(&mut date, DOC);
        assert_eq!(date.value(), Some("19800102"));

        let mut effective = Field::interval(
            "effective",
            "observation/effectiveTime",
            IntervalPrecision::DateTime,
        );
        extract(&mut effective, DOC);
        assert_eq!(effective.value(), Some("20240101"));
        match effective.kind() {
            FieldKind::Interval(p) => assert_eq!(p.high_value.as_deref(), Some("20240105093000")),
            other => panic!("Unexpected kind {}", other.name()),
        }
    }

    #[test]
    fn test_person_name_and_address() {
        let mut name = Field::person_name("patientName", "patient/name");
        extract(&mut name, DOC);
        assert_eq!(name.value(), Some("Dr. Jane Q Doe"));
        match name.kind() {
            FieldKind::PersonName(p) => {
                assert_eq!(p.given.as_deref(), Some("Jane Q"));
                assert_eq!(p.suffix, None);
            }
            other => panic!("Unexpected kind {}", other.name()),
        }

        let mut addr = Field::address("home", "patient/addr");
        extract(&mut addr, DOC);
        assert_eq!(addr.value(), Some("1 Main St, Springfield, IL, 62701"));
    }

    #[test]
    fn test_cause_of_death() {
        let mut field = Field::cause_of_death("cause", "observation", None, None);
        extract(&mut field, DOC);
        assert_eq!(field.value(), Some("Positive"));
        match field.kind() {
            FieldKind::CauseOfDeath(p) => assert_eq!(p.onset_interval.as_deref(), Some("2 h")),
            other => panic!("Unexpected kind {}", other.name()),
        }
    }

    #[test]
    fn test_attribute_bag() {
        let mut field = Field::attribute_bag(
            "race",
            "patient/raceCode",
            vec!["code".into(), "displayName".into(), "missing".into()],
        );
        extract(&mut field, DOC);
        match field.kind() {
            FieldKind::AttributeBag(p) => {
                assert_eq!(p.values["code"].as_deref(), Some("2106-3"));
                assert_eq!(p.values["displayName"].as_deref(), Some("White"));
                assert_eq!(p.values["missing"], None);
            }
            other => panic!("Unexpected kind {}", other.name()),
        }
    }

    #[test]
    fn test_composite_reads_nested_fields_from_same_node() {
        let mut field = Field::composite(
            "lab",
            "observation",
            vec![
                Field::coded("code", "code"),
                Field::interval("effective", "effectiveTime", IntervalPrecision::Date),
            ],
        );
        extract(&mut field, DOC);
        match field.kind() {
            FieldKind::Composite(p) => {
                assert_eq!(p.class_code.as_deref(), Some("OBS"));
                assert_eq!(p.mood_code.as_deref(), Some("EVN"));
                assert_eq!(p.status_code.as_deref(), Some("completed"));
                assert_eq!(p.reference.as_deref(), Some("#obs1"));
                assert_eq!(p.field("code").and_then(Field::value), Some("12345"));
                assert_eq!(p.field("effective").and_then(Field::value), Some("20240101"));
            }
            other => panic!("Unexpected kind {}", other.name()),
        }
    }

    #[test]
    fn test_missing_node_leaves_payload_empty() {
        let mut field = Field::coded("diagnosis", "observation/nothing");
        extract(&mut field, DOC);
        assert_eq!(field.value(), None);
    }

    #[test]
    fn test_no_leakage_between_documents() {
        let mut field = Field::identifier("ssn", "patient/id");
        extract(&mut field, DOC);
        assert!(field.value().is_some());

        extract(&mut field, "<ClinicalDocument><patient><id root=\"1.2\"/></patient></ClinicalDocument>");
        assert_eq!(field.value(), Some("1.2"));
        match field.kind() {
            FieldKind::Identifier(p) => assert_eq!(p.extension, None),
            other => panic!("Unexpected kind {}", other.name()),
        }
    }
}
