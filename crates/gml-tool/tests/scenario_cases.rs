use std::path::Path;

#[test]
fn every_scenario_case_passes() {
    let cases_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("cases");
    let count = gml_tool::assert_cases_in_dir(&cases_dir).unwrap_or_else(|error| panic!("{}", error));
    assert!(count >= 12, "expected the bundled cases, ran {}", count);
}
