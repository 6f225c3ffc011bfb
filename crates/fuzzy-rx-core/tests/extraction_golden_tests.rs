//! Golden tests for prescription extraction.
//!
//! These tests run the full pipeline against known OCR texts and records.

use std::sync::Arc;

use fuzzy_rx_core::models::DrugCatalog;
use fuzzy_rx_core::resolver::ExtractionPipeline;
use fuzzy_rx_core::{DrugCandidate, PrescriptionRecord};
use serde_json::json;

/// Test case from golden file.
struct GoldenCase {
    id: &'static str,
    text: &'static str,
    expected_doctor: Option<&'static str>,
    expected_drugs: &'static [&'static str],
    expected_confirmed: bool,
}

fn catalog() -> Arc<DrugCatalog> {
    Arc::new(DrugCatalog::new(vec![
        "Paracetamol 500mg",
        "Amoxicillin 250mg",
        "Brufen 400mg",
        "Augmentin 1g",
        "Concor 5mg",
        "بروفين 400",
    ]))
}

fn get_golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            id: "misspelled-paracetamol",
            text: "Dr. Ahmed Hassan\nParacetmol 500\n",
            expected_doctor: Some("Ahmed Hassan"),
            expected_drugs: &["Paracetamol 500mg"],
            expected_confirmed: false,
        },
        GoldenCase {
            id: "exact-lines",
            text: "Augmentin 1g\nBrufen 400mg",
            expected_doctor: None,
            expected_drugs: &["Augmentin 1g", "Brufen 400mg"],
            expected_confirmed: true,
        },
        GoldenCase {
            id: "arabic-header",
            text: "الدكتور محمد علي\nبروفين 400!",
            expected_doctor: Some("محمد علي"),
            expected_drugs: &["بروفين 400"],
            expected_confirmed: true,
        },
        GoldenCase {
            id: "mixed-confidence-lines",
            text: "Augmentin\nParacetmol 500",
            expected_doctor: None,
            expected_drugs: &["Augmentin 1g"],
            expected_confirmed: true,
        },
        GoldenCase {
            id: "misspelled-amoxicillin",
            text: "DOCTOR Mona Adel, MD\nAmoxicilin 250",
            expected_doctor: Some("Mona Adel"),
            expected_drugs: &["Amoxicillin 250mg"],
            expected_confirmed: false,
        },
        GoldenCase {
            id: "abbreviated-amoxicillin",
            text: "Amox 250",
            expected_doctor: None,
            expected_drugs: &["Amoxicillin 250mg"],
            expected_confirmed: false,
        },
        GoldenCase {
            id: "unreadable",
            text: "xyz qqq",
            expected_doctor: None,
            expected_drugs: &[],
            expected_confirmed: false,
        },
        GoldenCase {
            id: "short-lines-ignored",
            text: "Rx\n5mg\n",
            expected_doctor: None,
            expected_drugs: &[],
            expected_confirmed: false,
        },
    ]
}

#[test]
fn test_golden_cases() {
    let pipeline = ExtractionPipeline::with_defaults(catalog()).unwrap();

    for case in get_golden_cases() {
        let result = pipeline.process(&PrescriptionRecord::from_text(case.text));

        assert_eq!(
            result.doctor_name.as_deref(),
            case.expected_doctor,
            "Case {}: doctor mismatch",
            case.id
        );

        let names: Vec<&str> = result.drugs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, case.expected_drugs, "Case {}: drug mismatch", case.id);

        for drug in &result.drugs {
            assert_eq!(
                drug.is_confirmed(),
                case.expected_confirmed,
                "Case {}: unexpected score {} for {}",
                case.id,
                drug.score,
                drug.name
            );
            assert!(
                drug.score >= 50.0 && drug.score <= 100.0,
                "Case {}: score {} out of range",
                case.id,
                drug.score
            );
        }
    }
}

#[test]
fn test_catalog_query_example() {
    let pipeline = ExtractionPipeline::with_defaults(Arc::new(DrugCatalog::new(vec![
        "Paracetamol 500mg",
        "Amoxicillin 250mg",
    ])))
    .unwrap();

    let matches = pipeline.match_text("paracetamol", 1);

    assert_eq!(matches, vec![DrugCandidate::new("Paracetamol 500mg", 100.0)]);
}

#[test]
fn test_confirmed_record_skips_text() {
    let pipeline = ExtractionPipeline::with_defaults(catalog()).unwrap();
    let record = json!({
        "confirmedDrugs": "[{\"name\": \"Ibuprofen\"}]",
        "fullTextAnnotation": {"text": "Augmentin 1g\nBrufen 400mg"}
    });

    let result = pipeline.process_value(&record);

    assert_eq!(result.drugs, vec![DrugCandidate::new("Ibuprofen", 100.0)]);
    assert!(result.provenance.confirmed);
}

#[test]
fn test_literal_confirmed_record() {
    let pipeline = ExtractionPipeline::with_defaults(catalog()).unwrap();
    let record = json!({
        "confirmedDrugs": "[{'name': 'Concor 5mg', 'quantity': 2}, {'name': 'Brufen 400mg'}]",
        "textAnnotations": "[{'description': 'Dr. Ali Omar\\nsomething else'}]"
    });

    let result = pipeline.process_value(&record);

    assert_eq!(result.drug_names(), "Concor 5mg, Brufen 400mg");
    assert_eq!(result.doctor_name.as_deref(), Some("Ali Omar"));
}

#[test]
fn test_malformed_confirmed_record_uses_text() {
    let pipeline = ExtractionPipeline::with_defaults(catalog()).unwrap();
    let record = json!({
        "confirmedDrugs": "[{\"name\": \"Ibuprofen\"",
        "textAnnotations": [{"description": "Brufen 400mg"}, {"description": "Brufen"}]
    });

    let result = pipeline.process_value(&record);

    assert!(!result.provenance.confirmed);
    assert_eq!(result.drugs, vec![DrugCandidate::new("Brufen 400mg", 100.0)]);
}

#[test]
fn test_doctor_name_excludes_drug_line() {
    // A drug line that contains the doctor's name is dropped by substring
    let pipeline = ExtractionPipeline::with_defaults(catalog()).unwrap();

    let result = pipeline.process(&PrescriptionRecord::from_text(
        "Dr. Concor\nConcor 5mg\nAugmentin 1g",
    ));

    assert_eq!(result.doctor_name.as_deref(), Some("Concor"));
    assert_eq!(result.drug_names(), "Augmentin 1g");
}
