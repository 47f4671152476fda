use greenmap::{match_patterns, rewrite, RuleRegistry};
use indoc::indoc;
use pretty_assertions::assert_eq;

#[test]
fn test_summed_list_comprehension_round_trip() {
    let registry = RuleRegistry::builtin().unwrap();
    let code = "sum([i*i for i in range(1000000)])";
    let result = rewrite(code, &match_patterns(&registry, code));

    assert!(result
        .rewritten_code
        .contains("sum(i*i for i in range(1000000))"));
    assert!(result.rationale.to_lowercase().contains("memory optimization"));
    assert!(result.rationale.ends_with("\n\n"));
}

#[test]
fn test_rewrite_keeps_surrounding_code() {
    let registry = RuleRegistry::builtin().unwrap();
    let code = indoc! {"
        import math
        total = sum([math.sqrt(v) for v in values])
        print(total)
    "};
    let result = rewrite(code, &match_patterns(&registry, code));
    assert_eq!(
        result.rewritten_code,
        indoc! {"
            import math
            total = sum(math.sqrt(v) for v in values)
            print(total)
        "}
    );
}

#[test]
fn test_matches_without_fix_leave_code_and_rationale_empty() {
    let registry = RuleRegistry::builtin().unwrap();
    let code = "for i in range(len(xs)):\n    y = xs[i] ** 2\n";
    let matches = match_patterns(&registry, code);
    assert!(!matches.is_empty());

    let result = rewrite(code, &matches);
    assert_eq!(result.rewritten_code, code);
    assert_eq!(result.rationale, "");
    assert!(!result.changed());
}

#[test]
fn test_rewritten_code_parses_when_input_parses() {
    let registry = RuleRegistry::builtin().unwrap();
    let code = "total = sum([x * 2 for x in data if x > 0])\n";
    let result = rewrite(code, &match_patterns(&registry, code));
    let report = greenmap::analyze_static(&result.rewritten_code);
    assert!(report.error.is_none());
    assert!(report.operations < greenmap::analyze_static(code).operations);
}
