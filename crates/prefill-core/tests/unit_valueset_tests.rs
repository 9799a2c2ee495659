//! Registry-level tests for value sets

use prefill_core::valueset::{ValueSetBundle, ValueSetDefinition};
use prefill_core::{CoreError, ValueRegistryBuilder};

fn sti_bundle() -> ValueSetBundle {
    ValueSetBundle {
        source: "sti-valuesets".to_string(),
        value_sets: vec![
            ValueSetDefinition::new("CHLAMYDIA_NCHS", "Chlamydia (NCHS)", "2.16.840.1.1")
                .with_code("12345", "Chlamydia trachomatis", "9.9")
                .with_code("A56.0", "Chlamydial infection of lower genitourinary tract", "2.16.840.1.113883.6.90"),
            ValueSetDefinition::new("GONORRHEA_NCHS", "Gonorrhea (NCHS)", "2.16.840.1.2")
                .with_code("A54.9", "Gonococcal infection, unspecified", "2.16.840.1.113883.6.90"),
        ],
    }
}

#[test]
fn test_membership_requires_exact_system_when_given() {
    let mut builder = ValueRegistryBuilder::new();
    builder.load_bundle(&sti_bundle()).unwrap();
    let registry = builder.freeze();
    let set = registry.by_name("Chlamydia (NCHS)").unwrap();

    for entry in set.entries() {
        assert!(set.is_member(&entry.code, Some(&entry.code_system)));
        assert!(set.is_member(&entry.code, Some(&entry.code_system.to_uppercase())));
        assert!(set.is_member(&entry.code, None));
        assert!(!set.is_member(&entry.code, Some("0.0.0")));
    }
    assert!(!set.is_member("A54.9", None));
}

#[test]
fn test_rerunning_loader_adds_nothing() {
    let mut builder = ValueRegistryBuilder::new();
    builder.load_bundle(&sti_bundle()).unwrap();

    // Same data under a different source label is merged, not duplicated
    let mut again = sti_bundle();
    again.source = "sti-valuesets-copy".to_string();
    assert!(builder.load_bundle(&again).unwrap());

    let registry = builder.freeze();
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.by_code("CHLAMYDIA_NCHS").unwrap().len(), 2);
    assert_eq!(registry.by_code("GONORRHEA_NCHS").unwrap().len(), 1);
}

#[test]
fn test_conflicting_name_is_duplicate_key() {
    let mut builder = ValueRegistryBuilder::new();
    builder.load_bundle(&sti_bundle()).unwrap();

    let conflicting = ValueSetDefinition::new("CHLAMYDIA_V2", "Chlamydia (NCHS)", "2.16.840.1.9");
    let err = builder.load_definition(&conflicting).unwrap_err();
    assert!(matches!(err, CoreError::DuplicateKey(_)));
}

#[test]
fn test_value_sets_keep_registration_order() {
    let mut builder = ValueRegistryBuilder::new();
    builder.load_bundle(&sti_bundle()).unwrap();
    let registry = builder.freeze();

    let codes: Vec<&str> = registry.value_sets().map(|s| s.code.as_str()).collect();
    assert_eq!(codes, vec!["CHLAMYDIA_NCHS", "GONORRHEA_NCHS"]);
}

#[test]
fn test_failed_bundle_leaves_registry_untouched() {
    let mut builder = ValueRegistryBuilder::new();
    builder.load_bundle(&sti_bundle()).unwrap();

    let broken = ValueSetBundle {
        source: "syphilis".to_string(),
        value_sets: vec![
            ValueSetDefinition::new("SYPHILIS_NCHS", "Syphilis (NCHS)", "2.16.840.1.3")
                .with_code("A53.9", "Syphilis, unspecified", "2.16.840.1.113883.6.90"),
            // Name already taken by another code
            ValueSetDefinition::new("GONORRHEA_V2", "Gonorrhea (NCHS)", "2.16.840.1.4"),
        ],
    };
    let err = builder.load_bundle(&broken).unwrap_err();
    assert!(matches!(err, CoreError::DuplicateKey(_)));
    assert_eq!(builder.len(), 2);
    assert!(!builder.is_loaded("syphilis"));

    // The corrected bundle loads under the same source
    let mut fixed = broken;
    fixed.value_sets.truncate(1);
    assert!(builder.load_bundle(&fixed).unwrap());

    let registry = builder.freeze();
    assert_eq!(registry.len(), 3);
    assert!(registry.is_member("SYPHILIS_NCHS", "A53.9", None));
}
