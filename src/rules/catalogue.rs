//! The twenty builtin dirty-code rules, in registry order.

use super::RuleSpec;

/// Rule id whose matches the rewriter knows how to fix mechanically.
pub const GEN_EXP: &str = "gen_exp";

pub const BUILTIN_RULES: &[RuleSpec<'static>] = &[
    RuleSpec::new(
        GEN_EXP,
        r"sum\(\[.*for.*in.*\]\)",
        "Use generator: sum(x for x in data)",
    ),
    RuleSpec::new(
        "str_concat",
        r#"s\s*=\s*['"].*['"].*s\s*\+=\s*.*"#,
        "Use ''.join(list) instead of +=",
    ),
    RuleSpec::new(
        "set_lookup",
        r"if\s+.*\s+in\s+.*list",
        "Convert list to set() for O(1) lookup",
    ),
    RuleSpec::new(
        "file_stream",
        r"open\(.*\)\.read\(\)",
        "Use streaming: with open() as f: for line in f:",
    ),
    RuleSpec::new(
        "nested_loops",
        r"for.*:\s*\n?\s*for.*:",
        "Use HashMaps/Sets to reduce complexity to O(n)",
    ),
    RuleSpec::new(
        "busy_wait",
        r"while\s+True:\s*pass",
        "Use time.sleep() to reduce CPU cycles",
    ),
    RuleSpec::new(
        "map_filt",
        r"map\(lambda|filter\(lambda",
        "Use list comprehensions",
    ),
    RuleSpec::new(
        "global_ref",
        r"global\s+\w+",
        "Use local variables instead of globals",
    ),
    RuleSpec::new(
        "df_iter",
        r"\.iterrows\(\)",
        "Use .itertuples() for Pandas iteration",
    ),
    RuleSpec::new(
        "len_cache",
        r"while.*len\(.*\):",
        "Cache len() in a variable before the loop",
    ),
    RuleSpec::new("enum_opt", r"range\(len\(.*\)\)", "Use enumerate()"),
    RuleSpec::new("dict_keys", r"\.keys\(\)", "Check 'if k in d' directly"),
    RuleSpec::new("string_io", r"\+=.*large_string", "Use io.StringIO"),
    RuleSpec::new(
        "tuple_swap",
        r"temp\s*=\s*a;\s*a\s*=\s*b",
        "Use 'a, b = b, a'",
    ),
    RuleSpec::new(
        "imp_loop",
        r"for.*:\s*\n?\s*import",
        "Move imports to top of file",
    ),
    RuleSpec::new("while_one", r"while\s+1:", "Use 'while True'"),
    RuleSpec::new("list_ext", r"for.*append", "Use .extend()"),
    RuleSpec::new(
        "try_loop",
        r"for.*:\s*\n?\s*try:",
        "Move try/except outside the loop",
    ),
    RuleSpec::new("pow_opt", r"\*\* 2", "Use 'x * x'"),
    RuleSpec::new("gc_man", r"gc\.disable", "Enable gc.collect() manually"),
];
