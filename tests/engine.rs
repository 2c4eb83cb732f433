//! Matching and backtracking behavior of the rule combinators.

use std::io::Cursor;

use abnf_engine::{GrammarError, RuleId, Ruleset};

fn input(text: &str) -> Cursor<Vec<u8>> {
    Cursor::new(text.as_bytes().to_vec())
}

#[track_caller]
fn text_of(rules: &Ruleset, rule: RuleId, n: usize, src: &mut Cursor<Vec<u8>>) -> String {
    let mut out = Vec::new();
    rules.write(rule, n, src, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn literal_matches_case_insensitively() {
    let mut rules = Ruleset::new();
    let foo = rules.literal("Foo");

    let mut src = input("fOo");
    assert!(rules.read(foo, &mut src));
    assert_eq!(rules.read_count(foo), 1);
    assert_eq!(text_of(&rules, foo, 0, &mut src), "fOo");

    let mut src = input("foX");
    assert!(!rules.read(foo, &mut src));
    assert_eq!(rules.read_count(foo), 0);
}

#[test]
fn empty_literal_matches_nothing() {
    let mut rules = Ruleset::new();
    let nothing = rules.literal("");
    assert!(!rules.read(nothing, &mut input("anything")));
}

#[test]
fn range_matches_single_byte() {
    let mut rules = Ruleset::new();
    let digit = rules.range(0x30, 0x39);

    let mut src = input("5");
    assert!(rules.read(digit, &mut src));
    assert_eq!(text_of(&rules, digit, 0, &mut src), "5");

    assert!(!rules.read(digit, &mut input("/")));
}

#[test]
fn swapped_range_bounds_behave_like_single_byte() {
    let mut rules = Ruleset::new();
    let only_a = rules.range(b'a', 0x00);
    assert!(rules.read(only_a, &mut input("a")));
    assert!(!rules.read(only_a, &mut input("b")));
}

#[test]
fn char_set_matches_members_only() {
    let mut rules = Ruleset::new();
    let sigil = rules.any_of("%&$");
    assert!(rules.read(sigil, &mut input("&")));
    assert!(!rules.read(sigil, &mut input("x")));

    let none = rules.any_of("");
    assert!(!rules.read(none, &mut input("x")));
}

#[test]
fn predicate_terminal_consults_the_function() {
    let mut rules = Ruleset::new();
    let vowel = rules.predicate(|b| b"aeiouAEIOU".contains(&b));
    assert!(rules.read(vowel, &mut input("e")));
    assert!(!rules.read(vowel, &mut input("z")));
}

#[test]
fn bounded_repetition_is_greedy() {
    let mut rules = Ruleset::core();
    let digit = rules.get("DIGIT");
    let run = rules.repeat(2..=4, digit).unwrap();

    let mut src = input("12345");
    assert!(rules.read(run, &mut src));
    assert_eq!(rules.read_count(run), 1);
    assert_eq!(text_of(&rules, run, 0, &mut src), "1234");
    // the fifth digit is left unread
    assert_eq!(src.position(), 4);
}

#[test]
fn repetition_below_minimum_fails() {
    let mut rules = Ruleset::core();
    let digit = rules.get("DIGIT");
    let run = rules.repeat(3.., digit).unwrap();

    let mut src = input("12x");
    assert!(!rules.read(run, &mut src));
    assert_eq!(rules.read_count(run), 0);
    assert_eq!(src.position(), 0);
}

#[test]
fn repetition_records_each_occurrence_in_order() {
    let mut rules = Ruleset::core();
    let digit = rules.get("DIGIT");
    let run = rules.repeat(1.., digit).unwrap();

    let mut src = input("1234x");
    assert!(rules.read(run, &mut src));
    assert_eq!(rules.read_count(digit), 4);
    let digits: Vec<String> = (0..4).map(|n| text_of(&rules, digit, n, &mut src)).collect();
    assert_eq!(digits, ["1", "2", "3", "4"]);
}

#[test]
fn concatenation_shrinks_the_left_side_on_right_failure() {
    let mut rules = Ruleset::core();
    let digit = rules.get("DIGIT");
    let run = rules.repeat(1.., digit).unwrap();
    let five = rules.byte(b'5');
    let both = rules.concat(run, five).unwrap();

    let mut src = input("12345");
    assert!(rules.read(both, &mut src));
    assert_eq!(text_of(&rules, both, 0, &mut src), "12345");
    assert_eq!(text_of(&rules, run, 0, &mut src), "1234");
}

#[test]
fn concatenation_shrinks_to_an_intermediate_length() {
    let mut rules = Ruleset::core();
    let digit = rules.get("DIGIT");
    let run = rules.repeat(2..=4, digit).unwrap();
    let tail = rules.literal("45");
    let both = rules.concat(run, tail).unwrap();

    let mut src = input("12345");
    assert!(rules.read(both, &mut src));
    assert_eq!(text_of(&rules, run, 0, &mut src), "123");
    assert_eq!(text_of(&rules, tail, 0, &mut src), "45");
}

#[test]
fn concatenation_commits_nothing_on_a_partial_match() {
    let mut rules = Ruleset::new();
    let ab = rules.literal("ab");
    let cd = rules.literal("cd");
    let both = rules.concat(ab, cd).unwrap();

    let mut src = input("abXX");
    assert!(!rules.read(both, &mut src));
    assert_eq!(rules.read_count(both), 0);
    assert_eq!(rules.read_count(ab), 0);
    assert_eq!(src.position(), 0);
}

#[test]
fn alternation_prefers_the_left_side() {
    let mut rules = Ruleset::new();
    let short = rules.literal("foo");
    let long = rules.literal("foobar");
    let either = rules.alternate(short, long).unwrap();

    let mut src = input("foobar");
    assert!(rules.read(either, &mut src));
    assert_eq!(text_of(&rules, either, 0, &mut src), "foo");
    assert_eq!(rules.read_count(either), 1);
    assert_eq!(rules.read_count(long), 0);
}

#[test]
fn alternation_falls_through_when_the_left_side_is_spent() {
    let mut rules = Ruleset::new();
    let ab = rules.literal("ab");
    let a = rules.literal("a");
    let head = rules.alternate(ab, a).unwrap();
    let tail = rules.literal("bc");
    let both = rules.concat(head, tail).unwrap();

    let mut src = input("abc");
    assert!(rules.read(both, &mut src));
    assert_eq!(text_of(&rules, head, 0, &mut src), "a");
    assert_eq!(text_of(&rules, a, 0, &mut src), "a");
    assert_eq!(rules.read_count(ab), 0);
}

#[test]
fn optional_rule_is_tried_empty_first() {
    let mut rules = Ruleset::new();
    let ab = rules.literal("ab");
    let opt = rules.repeat(0..=1, ab).unwrap();
    let both = rules.concat(opt, ab).unwrap();

    let mut src = input("abab");
    assert!(rules.read(both, &mut src));
    // the optional prefix stays empty because the tail already matches
    assert_eq!(src.position(), 2);
    assert_eq!(text_of(&rules, both, 0, &mut src), "ab");
}

#[test]
fn optional_rule_grows_when_the_tail_demands_it() {
    let mut rules = Ruleset::new();
    let a = rules.literal("a");
    let opt_a = rules.repeat(0..=1, a).unwrap();
    let b = rules.literal("b");
    let both = rules.concat(opt_a, b).unwrap();

    let mut src = input("ab");
    assert!(rules.read(both, &mut src));
    assert_eq!(text_of(&rules, both, 0, &mut src), "ab");
    assert_eq!(text_of(&rules, a, 0, &mut src), "a");
}

#[test]
fn linear_whitespace_grows_inside_a_sequence() {
    let mut rules = Ruleset::core();
    let lwsp = rules.get("LWSP");
    let x = rules.byte(b'x');
    let padded = rules.concat(lwsp, x).unwrap();

    let mut src = input("  \r\n x");
    assert!(rules.read(padded, &mut src));
    assert_eq!(text_of(&rules, lwsp, 0, &mut src), "  \r\n ");
}

#[test]
fn end_of_input_matches_without_a_segment() {
    let mut rules = Ruleset::new();
    let ab = rules.literal("ab");
    let eof = rules.eof();
    let whole = rules.concat(ab, eof).unwrap();

    let mut src = input("ab");
    assert!(rules.read(whole, &mut src));
    assert_eq!(rules.read_count(eof), 0);
    assert_eq!(text_of(&rules, whole, 0, &mut src), "ab");

    let mut src = input("abc");
    assert!(!rules.read(whole, &mut src));
    assert_eq!(src.position(), 0);
}

#[test]
fn failed_read_restores_the_cursor() {
    let mut rules = Ruleset::new();
    let abc = rules.literal("abc");

    let mut src = input("xxabd");
    src.set_position(2);
    assert!(!rules.read(abc, &mut src));
    assert_eq!(src.position(), 2);

    let mut src = input("xxabc");
    src.set_position(2);
    assert!(rules.read(abc, &mut src));
    assert_eq!(src.position(), 5);
    assert_eq!(text_of(&rules, abc, 0, &mut src), "abc");
}

#[test]
fn segments_are_never_empty() {
    let mut rules = Ruleset::core();
    let digit = rules.get("DIGIT");
    let run = rules.repeat(0.., digit).unwrap();
    let x = rules.byte(b'x');
    let whole = rules.concat(run, x).unwrap();

    let mut src = input("12x");
    assert!(rules.read(whole, &mut src));
    for rule in [whole, run, digit, x] {
        for n in 0..rules.read_count(rule) {
            assert!(!text_of(&rules, rule, n, &mut src).is_empty());
        }
    }
}

#[test]
fn shared_rule_records_sites_in_source_order() {
    let mut rules = Ruleset::core();
    let digit = rules.get("DIGIT");
    let dash = rules.byte(b'-');
    let head = rules.concat(digit, dash).unwrap();
    let pair = rules.concat(head, digit).unwrap();

    let mut src = input("1-2");
    assert!(rules.read(pair, &mut src));
    assert_eq!(rules.read_count(digit), 2);
    assert_eq!(text_of(&rules, digit, 0, &mut src), "1");
    assert_eq!(text_of(&rules, digit, 1, &mut src), "2");
}

#[test]
fn clear_is_recursive_and_idempotent() {
    let mut rules = Ruleset::core();
    let digit = rules.get("DIGIT");
    let run = rules.repeat(1.., digit).unwrap();

    let mut src = input("123");
    assert!(rules.read(run, &mut src));
    assert!(rules.read_count(run) > 0);
    assert!(rules.read_count(digit) > 0);

    rules.clear(run);
    rules.clear(run);
    assert_eq!(rules.read_count(run), 0);
    assert_eq!(rules.read_count(digit), 0);

    // writing after clear is a no-op
    let mut out = Vec::new();
    rules.write(run, 0, &mut src, &mut out).unwrap();
    assert!(out.is_empty());
}

#[test]
fn rereading_discards_previous_results() {
    let mut rules = Ruleset::new();
    let foo = rules.literal("foo");

    assert!(rules.read(foo, &mut input("foo")));
    assert_eq!(rules.read_count(foo), 1);
    assert!(rules.read(foo, &mut input("FOO")));
    assert_eq!(rules.read_count(foo), 1);
}

#[test]
fn unknown_names_resolve_to_the_empty_rule() {
    let mut rules = Ruleset::new();
    let missing = rules.get("no-such-rule");
    assert!(!rules.defined("no-such-rule"));
    assert!(!rules.read(missing, &mut input("anything")));
    assert_eq!(rules.read_count(missing), 0);
}

#[test]
fn empty_rule_is_the_identity_of_alternation() {
    let mut rules = Ruleset::new();
    let missing = rules.get("no-such-rule");
    let x = rules.literal("x");
    let either = rules.alternate(missing, x).unwrap();

    let mut src = input("x");
    assert!(rules.read(either, &mut src));
    assert_eq!(text_of(&rules, either, 0, &mut src), "x");
}

#[test]
fn foreign_rules_are_rejected() {
    let mut here = Ruleset::new();
    let mut there = Ruleset::new();
    let ours = here.literal("a");
    let theirs = there.literal("b");

    assert!(here.owns(ours));
    assert!(!here.owns(theirs));
    assert_eq!(here.concat(ours, theirs), Err(GrammarError::ForeignRule));
    assert_eq!(here.alternate(theirs, ours), Err(GrammarError::ForeignRule));
    assert_eq!(here.repeat(0.., theirs), Err(GrammarError::ForeignRule));
    assert_eq!(here.define("b", theirs), Err(GrammarError::ForeignRule));
    assert!(here.concat(ours, ours).is_ok());
}
