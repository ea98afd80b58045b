//! Integration tests for fragment handling: inlining, combining, masking,
//! cycles, external fragments and the registry caches.

use graphql_codegen_config::{CodegenConfig, ExternalFragmentConfig, FragmentMode};
use graphql_selection::{FragmentUseState, ResolvedRun, SelectionShape};
use graphql_test_utils::fixtures::{FEED_ENTRY_FRAGMENT, GITHUNT_SCHEMA, STAR_WARS_SCHEMA};
use graphql_test_utils::{
    error_kinds, render_name_table, render_shape, test_run, test_run_with_config, TestRunBuilder,
};
use std::sync::Arc;

const FEED_QUERY: &str = "query Feed { feed(type: HOT) { id ...FeedEntry } }";

fn feed_run(config: CodegenConfig) -> ResolvedRun {
    TestRunBuilder::new(GITHUNT_SCHEMA)
        .with_document("fragments.graphql", FEED_ENTRY_FRAGMENT)
        .with_document("feed.graphql", FEED_QUERY)
        .with_config(config)
        .build()
}

fn mode(fragment_mode: FragmentMode) -> CodegenConfig {
    CodegenConfig {
        fragment_mode,
        ..CodegenConfig::default()
    }
}

fn nested(shape: &SelectionShape, field: &str) -> Arc<SelectionShape> {
    shape
        .field(field)
        .and_then(|f| f.nested.clone())
        .unwrap_or_else(|| panic!("no nested shape for {field}"))
}

fn operation_shape(run: &ResolvedRun, name: &str) -> Arc<SelectionShape> {
    run.operation(name)
        .unwrap_or_else(|| panic!("operation {name} did not resolve: {:?}", run.errors()))
        .shape
        .clone()
}

#[test]
fn test_inline_mode_expands_spreads() {
    let run = feed_run(CodegenConfig::default());
    assert!(run.errors().is_empty());

    insta::assert_snapshot!(render_shape(&operation_shape(&run, "Feed")), @r"
    Query {
      feed: [Entry] {
        id: Int!
        commentCount: Int!
        repository: Repository! {
          full_name: String!
          html_url: String!
          owner: User {
            avatar_url: String!
          }
        }
      }
    }
    ");
}

#[test]
fn test_mask_mode_hides_fragment_fields() {
    let run = feed_run(mode(FragmentMode::Mask));
    let feed = nested(&operation_shape(&run, "Feed"), "feed");

    let names: Vec<&str> = feed.own_fields.iter().map(|f| f.output_name.as_ref()).collect();
    assert_eq!(names, ["id"]);
    let fragment = feed.fragment_use("FeedEntry").unwrap();
    assert_eq!(fragment.state, FragmentUseState::Masked);
    assert_eq!(fragment.type_condition.as_ref(), "Entry");

    // The fragment itself still resolves in full
    let own = run.fragment("FeedEntry").unwrap();
    assert_eq!(own.shape.own_fields.len(), 3);
}

#[test]
fn test_unmask_directive_expands_in_mask_mode() {
    let run = TestRunBuilder::new(GITHUNT_SCHEMA)
        .with_document("fragments.graphql", FEED_ENTRY_FRAGMENT)
        .with_document(
            "feed.graphql",
            "query Feed { feed(type: HOT) { id ...FeedEntry @unmask } }",
        )
        .with_config(mode(FragmentMode::Mask))
        .build();
    let feed = nested(&operation_shape(&run, "Feed"), "feed");

    assert!(feed.fragment_spreads.is_empty());
    assert_eq!(feed.own_fields.len(), 3);
}

#[test]
fn test_repeated_spread_merges_conditional_flags() {
    let document = r"
        query Me($skip: Boolean!) {
            currentUser { ...UserLogin @skip(if: $skip) ...UserLogin }
            other: currentUser { ...UserLogin @skip(if: $skip) ...UserLogin @include(if: $skip) }
        }
        fragment UserLogin on User { login }
    ";

    for fragment_mode in [FragmentMode::Combine, FragmentMode::Mask] {
        let run = test_run_with_config(GITHUNT_SCHEMA, document, mode(fragment_mode));
        let root = operation_shape(&run, "Me");

        let merged = nested(&root, "currentUser");
        assert_eq!(merged.fragment_spreads.len(), 1);
        assert!(!merged.fragment_use("UserLogin").unwrap().conditional);

        let both_conditional = nested(&root, "other");
        assert!(both_conditional.fragment_use("UserLogin").unwrap().conditional);
    }

    // Inlining the same document agrees
    let inline = test_run(GITHUNT_SCHEMA, document);
    let root = operation_shape(&inline, "Me");
    assert!(!nested(&root, "currentUser").field("login").unwrap().conditional);
    assert!(nested(&root, "other").field("login").unwrap().conditional);
}

#[test]
fn test_mask_mode_is_noop_without_spreads() {
    let document = "query Me { currentUser { login } }";
    let masked = test_run_with_config(GITHUNT_SCHEMA, document, mode(FragmentMode::Mask));
    let inline = test_run(GITHUNT_SCHEMA, document);
    assert_eq!(operation_shape(&masked, "Me"), operation_shape(&inline, "Me"));
}

#[test]
fn test_combine_mode_keeps_named_reference() {
    let run = feed_run(mode(FragmentMode::Combine));
    let feed = nested(&operation_shape(&run, "Feed"), "feed");

    insta::assert_snapshot!(render_shape(&feed), @r"
    Entry {
      id: Int!
      ...FeedEntry [combined]
    }
    ");

    let fragment = run.fragment_shape("FeedEntry").unwrap();
    assert!(fragment.field("repository").is_some());
    assert_eq!(
        run.names().fragment_type_name("FeedEntry"),
        Some("FeedEntryFragment")
    );
}

#[test]
fn test_spread_on_narrower_type_becomes_variant() {
    let document = r#"
fragment DroidBits on Droid { primaryFunction }
query Hero { hero { name ...DroidBits } }
"#;

    let run = test_run(STAR_WARS_SCHEMA, document);
    let hero = nested(&operation_shape(&run, "Hero"), "hero");
    assert_eq!(hero.own_fields.len(), 1);
    let droid = hero.variant("Droid").unwrap();
    assert!(droid.field("primaryFunction").is_some());
    assert!(droid.field("name").is_some());
    assert_eq!(hero.uncovered_types(run.index()), [Arc::<str>::from("Human")]);

    let run = test_run_with_config(STAR_WARS_SCHEMA, document, mode(FragmentMode::Combine));
    let hero = nested(&operation_shape(&run, "Hero"), "hero");
    assert!(hero.fragment_spreads.is_empty());
    let droid = hero.variant("Droid").unwrap();
    assert_eq!(
        droid.fragment_use("DroidBits").map(|u| u.state),
        Some(FragmentUseState::Combined)
    );
}

const STAR_WARS_FRAGMENTS: &str = r#"
fragment CharacterFields on Character {
    name
    friends { name }
}

fragment HumanFields on Human {
    homePlanet
    ...CharacterFields
}

query Hero {
    hero {
        id
        ...HumanFields
        ... on Droid {
            primaryFunction
            ...CharacterFields @include(if: $withFriends)
        }
    }
}

query Search {
    search(text: "han") {
        ... on Character { ...CharacterFields }
        ... on Starship { name length }
    }
}
"#;

fn assert_same_resolution(a: &ResolvedRun, b: &ResolvedRun) {
    assert_eq!(a.outcomes().len(), b.outcomes().len());
    for (left, right) in a.outcomes().iter().zip(b.outcomes()) {
        let (Some(left), Some(right)) = (left.resolved(), right.resolved()) else {
            panic!("outcomes differ: {left:?} / {right:?}");
        };
        assert_eq!(left.shape, right.shape, "{}", left.definition);
    }
    assert_eq!(render_name_table(a.names()), render_name_table(b.names()));
}

#[test]
fn test_flatten_matches_inline_resolution() {
    let inline = test_run(STAR_WARS_SCHEMA, STAR_WARS_FRAGMENTS);
    let flattened = test_run_with_config(
        STAR_WARS_SCHEMA,
        STAR_WARS_FRAGMENTS,
        CodegenConfig {
            flatten_fragments: true,
            ..CodegenConfig::default()
        },
    );
    assert!(inline.errors().is_empty());
    assert_same_resolution(&inline, &flattened);

    let hero = nested(&operation_shape(&inline, "Hero"), "hero");
    insta::assert_snapshot!(render_shape(&hero), @r"
    Character {
      id: ID!
      on Human {
        id: ID!
        homePlanet: String
        name: String!
        friends: [Character] {
          name: String!
        }
      }
      on Droid {
        id: ID!
        primaryFunction: String
        name: String! [conditional]
        friends: [Character] [conditional] {
          name: String!
        }
      }
    }
    ");
}

#[test]
fn test_flatten_matches_mask_resolution() {
    let masked = test_run_with_config(STAR_WARS_SCHEMA, STAR_WARS_FRAGMENTS, mode(FragmentMode::Mask));
    let flattened = test_run_with_config(
        STAR_WARS_SCHEMA,
        STAR_WARS_FRAGMENTS,
        CodegenConfig {
            flatten_fragments: true,
            ..mode(FragmentMode::Mask)
        },
    );
    assert_same_resolution(&masked, &flattened);
}

#[test]
fn test_fragment_cycle_fails_every_participant() {
    let document = r#"
fragment A on User { login ...B }
fragment B on User { avatar_url ...A }
query Me { currentUser { ...A } }
query Other { currentUser { login } }
"#;

    for flatten_fragments in [false, true] {
        let config = CodegenConfig {
            flatten_fragments,
            ..CodegenConfig::default()
        };
        let run = test_run_with_config(GITHUNT_SCHEMA, document, config);

        let messages: Vec<String> = run
            .outcomes()
            .iter()
            .filter_map(|o| o.error())
            .map(|e| format!("{}: {}", e.kind(), e.to_string().split(": ").last().unwrap_or("")))
            .collect();
        assert_eq!(
            messages,
            [
                "CyclicFragment: A -> B -> A",
                "CyclicFragment: B -> A -> B",
                "CyclicFragment: A -> B -> A",
            ],
            "flatten_fragments = {flatten_fragments}"
        );
        assert!(run.operation("Other").is_some());
    }
}

#[test]
fn test_self_spread_is_a_cycle() {
    let run = test_run(
        GITHUNT_SCHEMA,
        "fragment Loop on User { login ...Loop }",
    );
    assert_eq!(error_kinds(&run), ["CyclicFragment"]);
    assert!(run.errors()[0].to_string().ends_with("Loop -> Loop"));
}

#[test]
fn test_fragments_walked_once_per_run() {
    let run = test_run(
        GITHUNT_SCHEMA,
        r#"
fragment UserLogin on User { login }
fragment EntryBits on Entry { postedBy { ...UserLogin } }
query A { currentUser { ...UserLogin } }
query B { feed(type: HOT) { ...EntryBits } }
query C { entry(repoFullName: "a/b") { ...EntryBits postedBy { ...UserLogin } } }
"#,
    );

    assert!(run.errors().is_empty());
    assert_eq!(run.registry().walk_count(), 2);

    let outcome = run.fragment("UserLogin").unwrap();
    let cached = run.fragment_shape("UserLogin").unwrap();
    assert!(Arc::ptr_eq(&outcome.shape, &cached));
}

#[test]
fn test_external_documents_contribute_fragments() {
    let run = TestRunBuilder::new(GITHUNT_SCHEMA)
        .with_external("shared.graphql", "fragment UserBits on User { login avatar_url }")
        .with_document("me.graphql", "query Me { currentUser { ...UserBits } }")
        .build();

    assert_eq!(run.outcomes().len(), 1);
    let user = nested(&operation_shape(&run, "Me"), "currentUser");
    assert_eq!(user.own_fields.len(), 2);
    assert!(run
        .registry()
        .get("UserBits")
        .unwrap()
        .origin()
        .is_external());
    assert_eq!(
        run.names().fragment_type_name("UserBits"),
        Some("UserBitsFragment")
    );
}

#[test]
fn test_configured_external_fragments() {
    let config = CodegenConfig {
        fragment_mode: FragmentMode::Combine,
        external_fragments: vec![ExternalFragmentConfig {
            name: "UserBits".to_string(),
            on_type: "User".to_string(),
            document: "fragment UserBits on User { login }".to_string(),
        }],
        ..CodegenConfig::default()
    };
    let run = test_run_with_config(
        GITHUNT_SCHEMA,
        "query Me { currentUser { ...UserBits } }",
        config,
    );

    let user = nested(&operation_shape(&run, "Me"), "currentUser");
    assert_eq!(
        user.fragment_use("UserBits").map(|u| u.state),
        Some(FragmentUseState::Combined)
    );
    let fragment = run.registry().get("UserBits").unwrap();
    assert_eq!(fragment.definition.uri.as_str(), "external://UserBits");
    assert!(run.fragment_shape("UserBits").unwrap().field("login").is_some());
}

#[test]
fn test_broken_external_fragment_is_reported_once() {
    let run = TestRunBuilder::new(GITHUNT_SCHEMA)
        .with_external("shared.graphql", "fragment Broken on User { nope }")
        .with_document("me.graphql", "query Me { currentUser { login } }")
        .build();

    assert!(run.operation("Me").is_some());
    assert_eq!(error_kinds(&run), ["UnknownField"]);
}

#[test]
fn test_identical_duplicate_fragment_is_registered_once() {
    let fragment = "fragment UserLogin on User { login }";
    let run = TestRunBuilder::new(GITHUNT_SCHEMA)
        .with_document("a.graphql", fragment)
        .with_document("b.graphql", fragment)
        .build();

    assert!(run.errors().is_empty());
    assert_eq!(run.outcomes().len(), 1);
    assert_eq!(run.registry().len(), 1);
}

#[test]
fn test_conflicting_duplicate_fragment() {
    let run = TestRunBuilder::new(GITHUNT_SCHEMA)
        .with_document("a.graphql", "fragment UserBits on User { login }")
        .with_document("b.graphql", "fragment UserBits on User { avatar_url }")
        .build();

    assert_eq!(error_kinds(&run), ["DuplicateFragmentName"]);
    assert!(run.errors()[0]
        .to_string()
        .contains("first defined in file:///a.graphql"));
    let resolved = run.fragment("UserBits").unwrap();
    assert!(resolved.shape.field("login").is_some());
}
