/// Decides whether a transaction's public argument satisfies a view's
/// predicate. The public argument is either the wildcard sentinel `"ALL"`,
/// which satisfies everything, or an underscore-delimited set of tags, which
/// satisfies the predicate iff one tag equals it exactly. Case-sensitive,
/// whole-token equality only.
pub fn satisfies(pub_arg: &str, predicate: &str) -> bool {
    if pub_arg == "ALL" {
        return true;
    }
    // An empty predicate would otherwise match the empty tokens of inputs
    // like "a__b".
    if predicate.is_empty() {
        return false;
    }
    pub_arg.split('_').any(|tag| tag == predicate)
}

#[test]
fn test_wildcard() {
    assert!(satisfies("ALL", "tagA"));
    assert!(satisfies("ALL", ""));
}

#[test]
fn test_token_equality() {
    assert!(satisfies("tagA_tagB", "tagA"));
    assert!(satisfies("tagA_tagB", "tagB"));
    assert!(satisfies("tagA", "tagA"));
    assert!(!satisfies("tagC_tagD", "tagA"));
}

#[test]
fn test_no_substring_or_prefix_match() {
    assert!(!satisfies("tagAX", "tagA"));
    assert!(!satisfies("XtagA", "tagA"));
    assert!(!satisfies("tagA", "tag"));
}

#[test]
fn test_case_sensitive() {
    assert!(!satisfies("taga", "tagA"));
    assert!(!satisfies("all", "tagA"));
}

#[test]
fn test_empty_predicate_never_matches() {
    assert!(!satisfies("tagA", ""));
    assert!(!satisfies("a__b", ""));
    assert!(!satisfies("", ""));
}
