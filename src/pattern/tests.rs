use super::{MatchOptions, PathMatcher, PathPattern, PatternMatcher};
use crate::error::PatternErrorKind;

fn compile(template: &str) -> PathPattern {
    PathPattern::compile(template, MatchOptions::default()).expect("template compiles")
}

fn kind_of(template: &str) -> PatternErrorKind {
    PathPattern::compile(template, MatchOptions::default())
        .expect_err("template is rejected")
        .kind
}

#[test]
fn test_root_path() {
    let pattern = compile("/");
    assert!(pattern.matches("/").is_some());
    assert!(pattern.matches("/a").is_none());
    assert!(pattern.param_names().is_empty());
}

#[test]
fn test_parameterized_path() {
    let pattern = compile("/:file");
    let m = pattern.matches("/some-file").expect("match");
    assert_eq!(m.get_param("file"), Some("some-file"));
    assert_eq!(m.path, "/some-file");
    assert!(pattern.matches("/some/file").is_none());
}

#[test]
fn test_nested_path() {
    let pattern = compile("/a/:b/c");
    let m = pattern.matches("/a/1/c").expect("match");
    assert_eq!(m.get_param("b"), Some("1"));
    assert_eq!(pattern.param_names().len(), 1);
}

#[test]
fn test_brace_params() {
    let pattern = compile("/items/{id}/parts/{part_id}");
    let m = pattern.matches("/items/7/parts/wheel").expect("match");
    assert_eq!(m.get_param("id"), Some("7"));
    assert_eq!(m.get_param("part_id"), Some("wheel"));
    assert_eq!(m.params_map().len(), 2);
}

#[test]
fn test_literal_needs_exact_segment() {
    let pattern = compile("/some-file");
    assert!(pattern.matches("/some-file").is_some());
    assert!(pattern.matches("/some-file.txt").is_none());
    assert!(pattern.matches("/somexfile").is_none());
}

#[test]
fn test_adjacent_params_split_at_first_separator() {
    let pattern = compile("/:a-:b");
    let m = pattern.matches("/x-y-z").expect("match");
    assert_eq!(m.get_param("a"), Some("x"));
    assert_eq!(m.get_param("b"), Some("y-z"));

    let m = compile("/:name.:ext").matches("/archive.tar.gz").expect("match");
    assert_eq!(m.get_param("name"), Some("archive"));
    assert_eq!(m.get_param("ext"), Some("tar.gz"));
}

#[test]
fn test_param_stops_at_query_and_fragment() {
    let pattern = compile("/:file");
    assert!(pattern.matches("/some-file?raw").is_none());
    assert!(pattern.matches("/some-file#top").is_none());
    assert_eq!(
        compile("/:file?").matches("/").map(|m| m.params.len()),
        Some(0)
    );
}

#[test]
fn test_optional_param() {
    let pattern = compile("/files/:name?");
    assert_eq!(pattern.matches("/files").expect("match").params.len(), 0);
    let m = pattern.matches("/files/a.txt").expect("match");
    assert_eq!(m.get_param("name"), Some("a.txt"));
    assert!(pattern.matches("/files/a/b").is_none());
}

#[test]
fn test_zero_or_more_param() {
    let pattern = compile("/files/:rest*");
    assert!(pattern.matches("/files").is_some());
    let m = pattern.matches("/files/a/b/c").expect("match");
    assert_eq!(m.get_param("rest"), Some("a/b/c"));
}

#[test]
fn test_one_or_more_param() {
    let pattern = compile("/files/:rest+");
    assert!(pattern.matches("/files").is_none());
    let m = pattern.matches("/files/a/b").expect("match");
    assert_eq!(m.get_param("rest"), Some("a/b"));
}

#[test]
fn test_custom_param_pattern() {
    let pattern = compile(r"/user/:id(\d+)");
    assert_eq!(
        pattern.matches("/user/42").expect("match").get_param("id"),
        Some("42")
    );
    assert!(pattern.matches("/user/abc").is_none());
}

#[test]
fn test_positional_params() {
    let pattern = compile(r"/logs/(\d+)/*");
    let m = pattern.matches("/logs/2024/app/today.log").expect("match");
    assert_eq!(m.get_param("0"), Some("2024"));
    assert_eq!(m.get_param("1"), Some("app/today.log"));
}

#[test]
fn test_escaped_colon_is_literal() {
    let pattern = compile(r"/c\:/temp");
    assert!(pattern.matches("/c:/temp").is_some());
    assert!(pattern.param_names().is_empty());
}

#[test]
fn test_case_insensitive_by_default() {
    assert!(compile("/Some-File").matches("/some-file").is_some());

    let options = MatchOptions {
        sensitive: true,
        ..MatchOptions::default()
    };
    let sensitive = PathPattern::compile("/Some-File", options).expect("compile");
    assert!(sensitive.matches("/some-file").is_none());
    assert!(sensitive.matches("/Some-File").is_some());
}

#[test]
fn test_trailing_slash() {
    let m = compile("/:file").matches("/some-file/").expect("match");
    assert_eq!(m.get_param("file"), Some("some-file"));
    assert_eq!(m.path, "/some-file/");

    let options = MatchOptions {
        strict: true,
        ..MatchOptions::default()
    };
    let strict = PathPattern::compile("/:file", options).expect("compile");
    assert!(strict.matches("/some-file/").is_none());
}

#[test]
fn test_prefix_matching() {
    let options = MatchOptions {
        end: false,
        ..MatchOptions::default()
    };
    let pattern = PathPattern::compile("/docs/:section", options).expect("compile");
    let m = pattern.matches("/docs/api/index.md").expect("match");
    assert_eq!(m.path, "/docs/api");
    assert_eq!(m.get_param("section"), Some("api"));
    assert!(pattern.matches("/docsx/api").is_none());
}

#[test]
fn test_params_not_carried_between_matches() {
    let pattern = compile("/:file");
    let first = pattern.matches("/one").expect("match");
    let second = pattern.matches("/two").expect("match");
    assert_eq!(first.get_param("file"), Some("one"));
    assert_eq!(second.get_param("file"), Some("two"));
}

#[test]
fn test_invalid_templates() {
    assert_eq!(kind_of(""), PatternErrorKind::Empty);
    assert_eq!(kind_of("/:"), PatternErrorKind::MissingName(1));
    assert_eq!(kind_of("/{}"), PatternErrorKind::MissingName(1));
    assert_eq!(kind_of("/{id"), PatternErrorKind::UnterminatedBrace(1));
    assert_eq!(kind_of(r"/:id(\d+"), PatternErrorKind::UnbalancedGroup(4));
    assert_eq!(kind_of("/:id()"), PatternErrorKind::EmptyGroup(4));
    assert_eq!(kind_of(r"/:id((\d+))"), PatternErrorKind::CapturingGroup(5));
    assert_eq!(
        kind_of("/:a/:a"),
        PatternErrorKind::DuplicateName("a".to_string())
    );
    assert_eq!(kind_of("/:ext(?:md)"), PatternErrorKind::GroupModifier(5));
    assert!(matches!(kind_of("/:id([)"), PatternErrorKind::Regex(_)));
}

#[test]
fn test_non_capturing_group_allowed() {
    let pattern = compile(r"/:ext((?:txt|md))");
    assert!(pattern.matches("/md").is_some());
    assert!(pattern.matches("/rs").is_none());
}

#[test]
fn test_matcher_trait_object() {
    let matcher = PathMatcher::default();
    let compiled = matcher.compile("/:file").expect("compile");
    assert_eq!(compiled.template(), "/:file");
    let m = compiled.test("/some-file").expect("match");
    assert_eq!(m.get_param("file"), Some("some-file"));
}
