//! Parameter flattening and template resolution
//!
//! Every field contributes parameters keyed by `name + suffix`, with the
//! suffix chosen per variant (`Code`, `DisplayName`, `Extension`, ...). The
//! bare name always carries the field value. Nested fields of a composite are
//! keyed `composite.child...`; accepted sequence clones are keyed
//! `sequence.prototypeN...` (1-based), and the first clone also under the
//! unindexed `sequence.prototype...`. Known fields always contribute all of
//! their keys, empty when nothing was extracted.

use indexmap::IndexMap;
use prefill_parser::substitute_placeholders;

use crate::field::{Field, FieldKind};
use crate::options::EngineOptions;

/// Ordered parameter name -> value map
pub type Parameters = IndexMap<String, String>;

/// Suffix of the placeholder that renders a field's markup fragment
pub const SNIPPET_SUFFIX: &str = "Snippet";

/// Flattens fields into [`Parameters`] and fills `${name}` templates
#[derive(Debug, Clone, Copy)]
pub struct ParameterResolver {
    max_depth: usize,
}

impl Default for ParameterResolver {
    fn default() -> Self {
        Self::from_options(&EngineOptions::default())
    }
}

impl ParameterResolver {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn from_options(options: &EngineOptions) -> Self {
        Self::new(options.max_flatten_depth)
    }

    /// Parameters of one field
    pub fn flatten(&self, field: &Field) -> Parameters {
        let mut out = Parameters::new();
        self.flatten_into(field, field.name(), &mut out, 0);
        out
    }

    /// Parameters of several fields, later fields overriding earlier keys
    pub fn flatten_all<'f, I>(&self, fields: I) -> Parameters
    where
        I: IntoIterator<Item = &'f Field>,
    {
        let mut out = Parameters::new();
        for field in fields {
            self.flatten_into(field, field.name(), &mut out, 0);
        }
        out
    }

    /// Parameter `name + suffix` of a field
    pub fn parameter(&self, field: &Field, suffix: &str) -> Option<String> {
        let key = format!("{}{}", field.name(), suffix);
        self.flatten(field).shift_remove(&key)
    }

    /// Substitute snippet placeholders, then scalar placeholders.
    ///
    /// Placeholders nothing answers for are left verbatim.
    pub fn resolve<'f, I>(&self, template: &str, fields: I) -> String
    where
        I: IntoIterator<Item = &'f Field>,
    {
        let fields: Vec<&Field> = fields.into_iter().collect();

        let snippets = self.render_snippets(fields.iter().copied());
        let text = substitute_placeholders(template, |name| snippets.get(name).cloned());

        let parameters = self.flatten_all(fields.iter().copied());
        substitute_placeholders(&text, |name| parameters.get(name).cloned())
    }

    /// `nameSnippet` -> rendered markup, for every field that has some
    pub fn render_snippets<'f, I>(&self, fields: I) -> Parameters
    where
        I: IntoIterator<Item = &'f Field>,
    {
        fields
            .into_iter()
            .filter_map(|field| {
                self.snippet(field)
                    .map(|markup| (format!("{}{}", field.name(), SNIPPET_SUFFIX), markup))
            })
            .collect()
    }

    /// Rendered markup fragment of a field.
    ///
    /// A field's own fragment is filled with the snippets of its nested fields
    /// and then with its own parameters. Composite and sequence fields without
    /// a fragment render as the concatenation of their nested fields' or
    /// accepted clones' fragments.
    pub fn snippet(&self, field: &Field) -> Option<String> {
        self.snippet_at(field, 0)
    }

    fn snippet_at(&self, field: &Field, depth: usize) -> Option<String> {
        if depth > self.max_depth {
            tracing::warn!(
                "Snippet of '{}' nested deeper than {}; skipped",
                field.name(),
                self.max_depth
            );
            return None;
        }

        let nested = self.nested_snippets(field, depth);

        match field.meta().snippet.as_deref() {
            Some(markup) => {
                let text = substitute_placeholders(markup, |name| nested.get(name).cloned());
                let parameters = self.flatten(field);
                Some(substitute_placeholders(&text, |name| {
                    parameters.get(name).cloned()
                }))
            }
            None if nested.is_empty() => None,
            None => Some(nested.into_values().collect()),
        }
    }

    fn nested_snippets(&self, field: &Field, depth: usize) -> Parameters {
        let mut out = Parameters::new();
        match field.kind() {
            FieldKind::Composite(payload) => {
                for child in &payload.fields {
                    if let Some(markup) = self.snippet_at(child, depth + 1) {
                        out.insert(format!("{}{}", child.name(), SNIPPET_SUFFIX), markup);
                    }
                }
            }
            FieldKind::Sequence(payload) => {
                let rendered: Vec<String> = payload
                    .accepted
                    .iter()
                    .filter_map(|clone| self.snippet_at(clone, depth + 1))
                    .collect();
                if !rendered.is_empty() {
                    out.insert(
                        format!("{}{}", payload.prototype.name(), SNIPPET_SUFFIX),
                        rendered.concat(),
                    );
                }
            }
            _ => {}
        }
        out
    }

    fn flatten_into(&self, field: &Field, root: &str, out: &mut Parameters, depth: usize) {
        if depth > self.max_depth {
            tracing::warn!(
                "Parameters of '{}' nested deeper than {}; skipped",
                root,
                self.max_depth
            );
            return;
        }

        let value = field.value();
        put(out, root, "", value);

        match field.kind() {
            FieldKind::Scalar { .. } => {}
            FieldKind::Coded(p) => {
                put(out, root, "Code", value);
                put(out, root, "DisplayName", p.display_name.as_deref());
                put(out, root, "CodeSystem", p.code_system.as_deref());
                put(out, root, "CodeSystemName", p.code_system_name.as_deref());
            }
            FieldKind::Identifier(p) => {
                put(out, root, "Root", value);
                put(out, root, "Extension", p.extension.as_deref());
            }
            FieldKind::Interval(p) => {
                put(out, root, "LowValue", value);
                put(out, root, "HighValue", p.high_value.as_deref());
            }
            FieldKind::PersonName(p) => {
                put(out, root, "Prefix", p.prefix.as_deref());
                put(out, root, "Given", p.given.as_deref());
                put(out, root, "Family", p.family.as_deref());
                put(out, root, "Suffix", p.suffix.as_deref());
            }
            FieldKind::Address(p) => {
                put(out, root, "StreetAddressLine", p.street.as_deref());
                put(out, root, "City", p.city.as_deref());
                put(out, root, "State", p.state.as_deref());
                put(out, root, "PostalCode", p.postal_code.as_deref());
                put(out, root, "Country", p.country.as_deref());
            }
            FieldKind::CauseOfDeath(p) => {
                put(out, root, "CauseOfDeath", value);
                put(out, root, "OnsetToDeathInterval", p.onset_interval.as_deref());
            }
            FieldKind::AttributeBag(p) => {
                for (attribute, attribute_value) in &p.values {
                    put(out, root, &capitalize(attribute), attribute_value.as_deref());
                }
            }
            FieldKind::Composite(p) => {
                put(out, root, "ClassCode", p.class_code.as_deref());
                put(out, root, "MoodCode", p.mood_code.as_deref());
                put(out, root, "Reference", p.reference.as_deref());
                put(out, root, "StatusCode", p.status_code.as_deref());
                for child in &p.fields {
                    let child_root = format!("{}.{}", root, child.name());
                    self.flatten_into(child, &child_root, out, depth + 1);
                }
            }
            FieldKind::Sequence(p) => {
                put(out, root, "Count", Some(p.count().to_string().as_str()));
                for (set_code, matched) in &p.side_channel {
                    put(out, root, set_code, Some(if *matched { "true" } else { "false" }));
                }

                let prototype = p.prototype.name();
                let first = p.accepted.first().unwrap_or(p.prototype.as_ref());
                self.flatten_into(first, &format!("{}.{}", root, prototype), out, depth + 1);
                for (i, clone) in p.accepted.iter().enumerate() {
                    let clone_root = format!("{}.{}{}", root, prototype, i + 1);
                    self.flatten_into(clone, &clone_root, out, depth + 1);
                }
            }
            FieldKind::Function(p) => {
                put(out, root, "ReturnValue", value);
                let text = p.rewritten.as_deref().unwrap_or(&p.spec.rule);
                put(out, root, "Function", Some(text));
            }
        }
    }
}

fn put(out: &mut Parameters, root: &str, suffix: &str, value: Option<&str>) {
    out.insert(format!("{}{}", root, suffix), value.unwrap_or_default().to_string());
}

/// `displayName` -> `DisplayName`
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Alias, FieldKind};
    use crate::function::FunctionSpec;

    fn scalar(name: &str, value: &str) -> Field {
        let mut field = Field::scalar(name, name);
        field.set_value(Some(value.to_string()));
        field
    }

    fn coded(name: &str, code: &str, display: &str) -> Field {
        let mut field = Field::coded(name, "code");
        field.set_value(Some(code.to_string()));
        if let FieldKind::Coded(p) = field.kind_mut() {
            p.display_name = Some(display.to_string());
            p.code_system = Some("9.9".to_string());
            p.aliases.push(Alias {
                code: "x".to_string(),
                code_system: None,
            });
        }
        field
    }

    #[test]
    fn test_populate_example() {
        let resolver = ParameterResolver::default();
        let name = scalar("name", "World");
        assert_eq!(resolver.resolve("Hello ${name}", [&name]), "Hello World");
        assert_eq!(
            resolver.resolve("Hello ${name} ${missing}", [&name]),
            "Hello World ${missing}"
        );
    }

    #[test]
    fn test_coded_parameters() {
        let resolver = ParameterResolver::default();
        let params = resolver.flatten(&coded("diagnosis", "12345", "Chlamydia"));
        assert_eq!(params["diagnosis"], "12345");
        assert_eq!(params["diagnosisCode"], "12345");
        assert_eq!(params["diagnosisDisplayName"], "Chlamydia");
        assert_eq!(params["diagnosisCodeSystem"], "9.9");
        assert_eq!(params["diagnosisCodeSystemName"], "");
        assert_eq!(
            resolver.parameter(&coded("diagnosis", "1", "d"), "CodeSystem"),
            Some("9.9".to_string())
        );
    }

    #[test]
    fn test_empty_field_contributes_empty_keys() {
        let resolver = ParameterResolver::default();
        let params = resolver.flatten(&Field::identifier("ssn", "id"));
        assert_eq!(params["ssnRoot"], "");
        assert_eq!(params["ssnExtension"], "");
        assert_eq!(resolver.resolve("[${ssnExtension}]", [&Field::identifier("ssn", "id")]), "[]");
    }

    #[test]
    fn test_attribute_bag_keys() {
        let mut field = Field::attribute_bag("race", "raceCode", vec!["code".into(), "displayName".into()]);
        if let FieldKind::AttributeBag(p) = field.kind_mut() {
            p.values.insert("code".to_string(), Some("2106-3".to_string()));
        }
        let params = ParameterResolver::default().flatten(&field);
        assert_eq!(params["raceCode"], "2106-3");
        assert_eq!(params["raceDisplayName"], "");
    }

    #[test]
    fn test_composite_recurses() {
        let mut field = Field::composite("lab", "observation", vec![coded("code", "A", "Alpha")]);
        if let FieldKind::Composite(p) = field.kind_mut() {
            p.class_code = Some("OBS".to_string());
        }
        let params = ParameterResolver::default().flatten(&field);
        assert_eq!(params["labClassCode"], "OBS");
        assert_eq!(params["labMoodCode"], "");
        assert_eq!(params["lab.codeDisplayName"], "Alpha");
    }

    #[test]
    fn test_sequence_keys() {
        let mut field = Field::sequence("results", "entry", Field::coded("value", "value"), None);
        if let FieldKind::Sequence(p) = field.kind_mut() {
            p.accepted.push(coded("value", "A", "Alpha"));
            p.accepted.push(coded("value", "B", "Beta"));
            p.side_channel.insert("X".to_string(), true);
        }
        field.set_value(Some("2".to_string()));

        let params = ParameterResolver::default().flatten(&field);
        assert_eq!(params["results"], "2");
        assert_eq!(params["resultsCount"], "2");
        assert_eq!(params["resultsX"], "true");
        assert_eq!(params["results.valueCode"], "A");
        assert_eq!(params["results.value1Code"], "A");
        assert_eq!(params["results.value2DisplayName"], "Beta");
    }

    #[test]
    fn test_empty_sequence_keys() {
        let field = Field::sequence("results", "entry", Field::coded("value", "value"), None);
        let params = ParameterResolver::default().flatten(&field);
        assert_eq!(params["resultsCount"], "0");
        assert_eq!(params["results.valueCode"], "");
        assert!(!params.contains_key("results.value1Code"));
    }

    #[test]
    fn test_function_keys() {
        let mut field = Field::function("sti", FunctionSpec::new("IF (x) THEN 'Y'"));
        field.set_value(Some("Y".to_string()));
        let params = ParameterResolver::default().flatten(&field);
        assert_eq!(params["stiReturnValue"], "Y");
        assert_eq!(params["stiFunction"], "IF (x) THEN 'Y'");
    }

    #[test]
    fn test_snippets_resolve_first_and_recurse() {
        let prototype = Field::coded("value", "value").with_snippet("<li>${valueDisplayName}</li>");
        let mut field = Field::sequence("results", "entry", prototype, None)
            .with_snippet("<ul>${valueSnippet}</ul><p>${resultsCount}</p>");
        if let FieldKind::Sequence(p) = field.kind_mut() {
            p.accepted.push(p.prototype.fresh_clone());
            p.accepted.push(p.prototype.fresh_clone());
            p.accepted[0].set_value(Some("A".into()));
            p.accepted[1].set_value(Some("B".into()));
            if let FieldKind::Coded(c) = p.accepted[0].kind_mut() {
                c.display_name = Some("Alpha".into());
            }
            if let FieldKind::Coded(c) = p.accepted[1].kind_mut() {
                c.display_name = Some("Beta".into());
            }
        }

        let resolver = ParameterResolver::default();
        assert_eq!(
            resolver.resolve("${resultsSnippet}", [&field]),
            "<ul><li>Alpha</li><li>Beta</li></ul><p>2</p>"
        );
    }

    #[test]
    fn test_composite_without_snippet_concatenates_children() {
        let child = scalar("note", "hi").with_snippet("<b>${note}</b>");
        let field = Field::composite("section", ".", vec![child]);
        assert_eq!(
            ParameterResolver::default().snippet(&field),
            Some("<b>hi</b>".to_string())
        );
        assert_eq!(ParameterResolver::default().snippet(&scalar("plain", "x")), None);
    }

    #[test]
    fn test_depth_bound() {
        let mut field = scalar("leaf", "v");
        for i in 0..5 {
            field = Field::composite(format!("level{}", i), ".", vec![field]);
        }
        let params = ParameterResolver::new(2).flatten(&field);
        assert!(params.contains_key("level4.level3.level2"));
        assert!(!params.contains_key("level4.level3.level2.level1"));
    }
}
