use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use graphql_codegen_config::{CodegenConfig, FragmentMode};
use graphql_hir::SchemaIndex;
use graphql_selection::{name_shapes, resolve_documents, NamerRoot, RootKind};
use graphql_syntax::{parse_document, parse_schema, SourceDocument};
use graphql_test_utils::fixtures::{FEED_ENTRY_FRAGMENT, GITHUNT_SCHEMA};
use graphql_types::{DocumentOrigin, FileUri};
use std::hint::black_box;

// Operations sharing one fragment, so fragment caching matters
const OPERATIONS: &str = r#"
fragment UserBits on User {
  login
  avatar_url
  html_url
}

query Feed($type: FeedType!, $offset: Int, $limit: Int) {
  currentUser { ...UserBits }
  feed(type: $type, offset: $offset, limit: $limit) {
    ...FeedEntry
    score
    postedBy { ...UserBits }
    comments { postedBy { ...UserBits } content }
  }
}

query Entry($repoFullName: String!) {
  entry(repoFullName: $repoFullName) {
    ...FeedEntry
    postedBy { ...UserBits }
    comments(limit: 10) { id createdAt content postedBy { login } }
  }
}

mutation Vote($repoFullName: String!, $type: VoteType!) {
  vote(repoFullName: $repoFullName, type: $type) { score vote { vote_value } }
}

subscription OnComment($repoFullName: String!) {
  commentAdded(repoFullName: $repoFullName) { id content postedBy { ...UserBits } }
}
"#;

fn documents() -> Vec<SourceDocument> {
    vec![
        parse_document(
            FEED_ENTRY_FRAGMENT,
            FileUri::new("file:///fragments.graphql"),
            DocumentOrigin::Local,
        ),
        parse_document(
            OPERATIONS,
            FileUri::new("file:///operations.graphql"),
            DocumentOrigin::Local,
        ),
    ]
}

fn schema_uri() -> FileUri {
    FileUri::new("file:///schema.graphql")
}

fn bench_parse_schema(c: &mut Criterion) {
    c.bench_function("parse_schema", |b| {
        b.iter(|| black_box(parse_schema(GITHUNT_SCHEMA, &schema_uri())));
    });
}

fn bench_schema_index(c: &mut Criterion) {
    let Ok(schema) = parse_schema(GITHUNT_SCHEMA, &schema_uri()) else {
        return;
    };
    c.bench_function("schema_index", |b| {
        b.iter(|| black_box(SchemaIndex::new(&schema)));
    });
}

/// A full run per fragment mode, including registry construction and naming
fn bench_resolve_documents(c: &mut Criterion) {
    let Ok(schema) = parse_schema(GITHUNT_SCHEMA, &schema_uri()) else {
        return;
    };
    let documents = documents();

    let configs = [
        ("inline", CodegenConfig::default()),
        (
            "inline_flattened",
            CodegenConfig {
                flatten_fragments: true,
                ..CodegenConfig::default()
            },
        ),
        (
            "combine",
            CodegenConfig {
                fragment_mode: FragmentMode::Combine,
                ..CodegenConfig::default()
            },
        ),
        (
            "mask",
            CodegenConfig {
                fragment_mode: FragmentMode::Mask,
                ..CodegenConfig::default()
            },
        ),
    ];

    let mut group = c.benchmark_group("resolve_documents");
    for (name, config) in &configs {
        group.bench_function(*name, |b| {
            b.iter(|| black_box(resolve_documents(&schema, &documents, &[], config)));
        });
    }
    group.finish();
}

fn bench_name_shapes(c: &mut Criterion) {
    let Ok(schema) = parse_schema(GITHUNT_SCHEMA, &schema_uri()) else {
        return;
    };
    let config = CodegenConfig {
        add_typename: true,
        ..CodegenConfig::default()
    };
    let run = resolve_documents(&schema, &documents(), &[], &config);

    c.bench_function("name_shapes", |b| {
        b.iter_batched(
            || {
                run.resolved()
                    .map(|resolved| NamerRoot {
                        definition: &resolved.definition,
                        kind: match resolved.operation_type {
                            Some(operation_type) => RootKind::Operation {
                                operation_type,
                                anonymous_index: resolved.anonymous_index,
                            },
                            None => RootKind::Fragment,
                        },
                        shape: &resolved.shape,
                    })
                    .collect::<Vec<_>>()
            },
            |roots| black_box(name_shapes(&roots, &config)),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_parse_schema,
    bench_schema_index,
    bench_resolve_documents,
    bench_name_shapes,
);

criterion_main!(benches);
