//! Common fixtures for SDK integration tests

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use prefill_core::ValueRegistry;
use prefill_parser::SchemaParser;
use prefill_sdk::{EngineOptions, PrefillEngine, ValueSetLoader};

pub const VALUE_SETS: &str = r#"
source: nchs-sti-2024
value_sets:
  - code: X
    name: Chlamydia (NCHS)
    oid: 2.16.840.1.114222.4.11.1
    description: Chlamydia result codes
    version: "2024"
    codes:
      - code: "12345"
        display_name: Chlamydia trachomatis
        code_system: "9.9"
  - code: G
    name: Gonorrhea (NCHS)
    oid: 2.16.840.1.114222.4.11.2
    version: "2024"
    codes:
      - code: "55555"
        display_name: Neisseria gonorrhoeae
        code_system: "9.9"
"#;

pub const STI_SCHEMA: &str = r#"
document_type: sti_case_report
description: Sexually transmitted infection case report
fields:
  - name: ssn
    kind: identifier
    path: "recordTarget/patientRole/id[@root='2.16.840.1.113883.4.1']"
  - name: patientName
    kind: person_name
    path: recordTarget/patientRole/patient/name
    snippet: "<span class=\"name\">${patientNameFamily}, ${patientNameGiven}</span>"
  - name: gender
    kind: coded
    path: recordTarget/patientRole/patient/administrativeGenderCode
  - name: birthDate
    kind: interval
    precision: date
    path: recordTarget/patientRole/patient/birthTime
  - name: a
    kind: sequence
    path: component/section/entry/observation
    prototype:
      name: value
      kind: coded
      path: value
      snippet: "<li>${valueDisplayName}</li>"
    trigger:
      kind: value_set
      value_sets: ["Chlamydia (NCHS)", "Gonorrhea (NCHS)"]
      match_code_system: true
  - name: sti
    kind: function
    rule: "IF ($A CONTAINS ValueSet (X)) THEN 'Z' SHALL = 'Y' ELSE 'N'"
    default: U
    variables:
      - field: a
        rewrites:
          - from: "$A CONTAINS ValueSet (X)"
            to: "'${aX}' == 'true'"
  - name: internalNote
    kind: scalar
    path: component/section/text
    template: false
"#;

pub const CASE_REPORT: &str = r#"<ClinicalDocument xmlns="urn:hl7-org:v3">
  <recordTarget>
    <patientRole>
      <id root="2.16.840.1.113883.4.1" extension="111-22-3333"/>
      <patient>
        <name><given>Jane</given><family>Doe</family></name>
        <administrativeGenderCode code="F" codeSystem="2.16.840.1.113883.5.1" displayName="Female"/>
        <birthTime value="19800102083000"/>
      </patient>
    </patientRole>
  </recordTarget>
  <component>
    <section>
      <text>reviewed</text>
      <entry><observation><value code="12345" codeSystem="9.9" displayName="Chlamydia trachomatis"/></observation></entry>
      <entry><observation><value code="99999" codeSystem="9.9" displayName="Unrelated"/></observation></entry>
      <entry><observation><value code="55555" codeSystem="1.1" displayName="Wrong system"/></observation></entry>
    </section>
  </component>
</ClinicalDocument>"#;

pub const EMPTY_REPORT: &str = r#"<ClinicalDocument xmlns="urn:hl7-org:v3"/>"#;

/// Registry loaded from [`VALUE_SETS`]
pub fn registry() -> Arc<ValueRegistry> {
    let mut loader = ValueSetLoader::new();
    loader.load_yaml_str(VALUE_SETS).expect("fixture value sets load");
    loader.finish()
}

/// Engine with the STI schema registered
pub fn engine() -> PrefillEngine {
    let mut engine = PrefillEngine::new(registry(), EngineOptions::default());
    let declaration = SchemaParser::parse_yaml(STI_SCHEMA).expect("fixture schema parses");
    engine
        .add_declaration(declaration)
        .expect("fixture schema builds");
    engine
}

/// Write `content` to `dir/name`
pub fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).expect("fixture file written");
}
