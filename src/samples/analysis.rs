use super::models::TestSelection;

pub const STANDARD_ANALYSIS: &str = "Standard Analysis";

/// `Standard Analysis`, followed by each enabled optional test in fixed order
pub fn describe_tests(tests: &TestSelection) -> String {
    let mut description = String::from(STANDARD_ANALYSIS);
    for test in tests.enabled_optional() {
        description.push_str(", ");
        description.push_str(test.label());
    }
    description
}
