use std::error::Error;

use proptest::prelude::*;

use logtrigger::exec::ShellAction;
use logtrigger::pattern::{interpolate, Captures};

type TestResult = Result<(), Box<dyn Error>>;

fn fields(pairs: &[(&str, &str)]) -> Captures {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn placeholders_are_replaced_by_field_values() {
    let f = fields(&[("user", "root"), ("ip", "10.0.0.1")]);
    assert_eq!(interpolate("{user}@{ip}", &f), "root@10.0.0.1");
    assert_eq!(interpolate("user={user} user={user}", &f), "user=root user=root");
}

#[test]
fn unresolved_placeholder_becomes_empty_string() {
    let f = fields(&[("msg", "disk full")]);
    assert_eq!(interpolate("[{missing}] {msg}", &f), "[] disk full");
    assert_eq!(interpolate("{missing}", &Captures::new()), "");
}

#[test]
fn non_placeholder_braces_are_kept_verbatim() {
    let f = fields(&[("x", "1")]);
    assert_eq!(interpolate("{ not a field }", &f), "{ not a field }");
    assert_eq!(interpolate("json: {\"k\": {x}}", &f), "json: {\"k\": 1}");
    assert_eq!(interpolate("{{x}}", &f), "{1}");
    assert_eq!(interpolate("open { only", &f), "open { only");
    assert_eq!(interpolate("}", &f), "}");
}

#[test]
fn shell_metacharacters_stay_inside_one_argument() -> TestResult {
    let action = ShellAction::new(["notify", "--title", "alert", "{msg}", "done"])?;
    let nasty = "x; rm -rf / && echo \"pwned\" | tee out $(id) `id`";

    let argv = action.render(&fields(&[("msg", nasty)]));

    assert_eq!(argv, vec!["notify", "--title", "alert", nasty, "done"]);
    Ok(())
}

#[test]
fn scenario_a_renders_notify_disk_full() -> TestResult {
    let action = ShellAction::new(["notify", "{msg}"])?;
    let argv = action.render(&fields(&[("msg", "disk full")]));
    assert_eq!(argv, vec!["notify", "disk full"]);
    Ok(())
}

proptest! {
    #[test]
    fn literal_templates_round_trip(template in "[^{]*", value in ".*") {
        let f = fields(&[("msg", value.as_str())]);
        prop_assert_eq!(interpolate(&template, &f), template);
    }

    #[test]
    fn any_value_stays_a_single_argument(value in ".*") {
        let action = ShellAction::new(["cmd", "--flag", "{v}", "tail"]).unwrap();
        let argv = action.render(&fields(&[("v", value.as_str())]));
        prop_assert_eq!(argv.len(), 4);
        prop_assert_eq!(&argv[0], "cmd");
        prop_assert_eq!(&argv[1], "--flag");
        prop_assert_eq!(&argv[2], &value);
        prop_assert_eq!(&argv[3], "tail");
    }
}
