//! Tests submission form gates across every field combination.

use selfsnap_core::{DEFAULT_TTL_DAYS, SubmissionForm};

fn form(host_file: &str, change_number: &str, ttl: u32) -> SubmissionForm {
    let mut form = SubmissionForm::new();
    form.set_host_file_ref(host_file);
    form.set_change_number(change_number);
    form.set_ttl_duration_days(ttl);
    form
}

#[test]
fn form_state_tests_defaults_to_seven_day_ttl_and_empty_fields() {
    let form = SubmissionForm::default();
    assert_eq!(form.ttl_duration_days(), DEFAULT_TTL_DAYS);
    assert_eq!(form.host_file_ref(), "");
    assert_eq!(form.change_number(), "");
    assert!(!form.is_submittable());
}

#[test]
fn form_state_tests_submittable_truth_table() {
    for host_file in ["", "vms.txt"] {
        for change_number in ["", "CHG0042"] {
            for ttl in [0_u32, 1, 30] {
                let expected = !host_file.is_empty() && !change_number.is_empty() && ttl >= 1;
                assert_eq!(
                    form(host_file, change_number, ttl).is_submittable(),
                    expected,
                    "host_file={host_file:?} change_number={change_number:?} ttl={ttl}"
                );
            }
        }
    }
}
