//! Integration tests for resolution errors and their isolation.

use graphql_selection::{DefinitionKind, DefinitionOutcome, ResolutionError};
use graphql_test_utils::assertions::format_errors;
use graphql_test_utils::fixtures::{GITHUNT_SCHEMA, STAR_WARS_SCHEMA};
use graphql_test_utils::{error_kinds, test_run};

#[test]
fn test_failure_is_isolated_to_its_definition() {
    let run = test_run(
        GITHUNT_SCHEMA,
        r#"
query Good { currentUser { login } }
query Bad { currentUser { nope } }
query AlsoGood { feed(type: TOP) { score } }
"#,
    );

    let states: Vec<(&str, bool)> = run
        .outcomes()
        .iter()
        .map(|o| (o.definition().display_name(), o.resolved().is_some()))
        .collect();
    assert_eq!(
        states,
        [("Good", true), ("Bad", false), ("AlsoGood", true)]
    );
    assert_eq!(error_kinds(&run), ["UnknownField"]);

    // Failed definitions contribute no names
    assert!(run
        .names()
        .entries()
        .iter()
        .all(|e| e.path.definition.display_name() != "Bad"));
}

#[test]
fn test_first_error_per_definition() {
    let run = test_run(
        GITHUNT_SCHEMA,
        "query Me { currentUser { nope } alsoNope }",
    );
    assert_eq!(error_kinds(&run), ["UnknownField"]);
    assert!(run.errors()[0].to_string().contains("\"nope\""));
}

#[test]
fn test_error_location_and_path() {
    let run = test_run(
        GITHUNT_SCHEMA,
        "query Me {\n  currentUser {\n    nope\n  }\n}",
    );
    insta::assert_snapshot!(format_errors(&run.errors()), @r#"[1] UnknownField: file:///query.graphql:3:5: Cannot query field "nope" on type "User" (at Me.currentUser.nope)"#);

    let errors = run.errors();
    let ResolutionError::UnknownField { location, .. } = errors[0] else {
        panic!("expected an unknown field error");
    };
    assert_eq!(location.start.line, 2);
    assert_eq!(location.start.character, 4);
}

#[test]
fn test_missing_subselection() {
    let run = test_run(GITHUNT_SCHEMA, "query Me { currentUser }");
    assert_eq!(error_kinds(&run), ["MissingSubselection"]);
}

#[test]
fn test_unexpected_subselection() {
    let run = test_run(GITHUNT_SCHEMA, "query Me { currentUser { login { length } } }");
    assert_eq!(error_kinds(&run), ["UnexpectedSubselection"]);
    assert!(run.errors()[0].to_string().contains("\"String\""));
}

#[test]
fn test_unknown_type_condition() {
    let run = test_run(
        STAR_WARS_SCHEMA,
        r#"
query Hero { hero { ... on Wookiee { id } } }
fragment Ghost on Wookiee { id }
"#,
    );
    assert_eq!(error_kinds(&run), ["UnknownType", "UnknownType"]);
}

#[test]
fn test_impossible_type_condition() {
    let run = test_run(
        STAR_WARS_SCHEMA,
        r#"
fragment DroidBits on Droid { primaryFunction }
query Ship { hero { ... on Starship { length } } }
query Human { human(id: "1000") { ...DroidBits } }
"#,
    );

    assert!(run.fragment("DroidBits").is_some());
    assert_eq!(
        error_kinds(&run),
        ["InvalidTypeCondition", "InvalidTypeCondition"]
    );
    assert!(run.errors()[0]
        .to_string()
        .contains("objects of type \"Character\" can never be of type \"Starship\""));
}

#[test]
fn test_overlapping_abstract_type_condition_is_accepted() {
    let run = test_run(
        STAR_WARS_SCHEMA,
        r#"
query Human { human(id: "1000") { ... on Character { name } } }
query Search { search(text: "r2") { ... on Character { name } } }
"#,
    );
    assert!(run.errors().is_empty(), "{}", format_errors(&run.errors()));

    // Interface on an object type: every possible type is covered
    let human = &run.operation("Human").unwrap().shape;
    let human = human.field("human").unwrap().nested.clone().unwrap();
    assert!(human.field("name").is_some());
    assert!(human.inline_variants.is_empty());

    // Interface on a union: only the shared members narrow
    let search = &run.operation("Search").unwrap().shape;
    let search = search.field("search").unwrap().nested.clone().unwrap();
    let variants: Vec<&str> = search
        .inline_variants
        .iter()
        .map(|v| v.type_name.as_ref())
        .collect();
    assert_eq!(variants, ["Human", "Droid"]);
}

#[test]
fn test_fragment_on_leaf_type() {
    let run = test_run(STAR_WARS_SCHEMA, "fragment Ep on Episode { name }");
    assert_eq!(error_kinds(&run), ["InvalidTypeCondition"]);
}

#[test]
fn test_missing_fragment_names_the_spreading_definition() {
    let run = test_run(
        GITHUNT_SCHEMA,
        r#"
fragment EntryBits on Entry { postedBy { ...Nope } }
query Me { currentUser { ...AlsoNope } }
"#,
    );

    let messages: Vec<String> = run.errors().iter().map(ToString::to_string).collect();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].ends_with("Unknown fragment \"Nope\" spread in fragment \"EntryBits\""));
    assert!(messages[1].ends_with("Unknown fragment \"AlsoNope\" spread in operation \"Me\""));
}

#[test]
fn test_missing_fragment_inside_spread_fails_spreading_operation() {
    let run = test_run(
        GITHUNT_SCHEMA,
        r#"
fragment EntryBits on Entry { postedBy { ...Nope } }
query Feed { feed(type: HOT) { ...EntryBits } }
"#,
    );

    let failed: Vec<&str> = run
        .outcomes()
        .iter()
        .filter(|o| o.error().is_some())
        .map(|o| o.definition().display_name())
        .collect();
    assert_eq!(failed, ["EntryBits", "Feed"]);
}

#[test]
fn test_missing_root_type() {
    let run = test_run(
        STAR_WARS_SCHEMA,
        "subscription OnReview { reviewAdded { stars } }",
    );

    let outcome = &run.outcomes()[0];
    let DefinitionOutcome::Failed { definition, error } = outcome else {
        panic!("expected a failure");
    };
    assert_eq!(definition.kind, DefinitionKind::Operation);
    assert_eq!(error.kind(), "MissingRootType");
    assert!(error.to_string().contains("operation \"OnReview\""));
}
