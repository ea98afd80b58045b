//! Shared schema fixtures.
//!
//! Use these when a test needs a realistic schema but the schema itself is
//! not the subject. When the test is about schema structure, prefer an
//! inline schema so the test stays self-documenting.

/// The GitHunt example schema: feeds of repository entries posted by users.
///
/// Object types only, several levels deep. Good for naming and
/// deduplication tests.
pub const GITHUNT_SCHEMA: &str = r#"
type Query {
    feed(type: FeedType!, offset: Int, limit: Int): [Entry]
    entry(repoFullName: String!): Entry
    currentUser: User
}

type Mutation {
    submitRepository(repoFullName: String!): Entry
    vote(repoFullName: String!, type: VoteType!): Entry
    submitComment(repoFullName: String!, commentContent: String!): Comment
}

type Subscription {
    commentAdded(repoFullName: String!): Comment
}

enum FeedType {
    HOT
    NEW
    TOP
}

enum VoteType {
    UP
    DOWN
    CANCEL
}

type Entry {
    id: Int!
    repository: Repository!
    postedBy: User!
    createdAt: Float!
    score: Int!
    hotScore: Float!
    comments(limit: Int, offset: Int): [Comment]!
    commentCount: Int!
    vote: Vote!
}

type Repository {
    name: String!
    full_name: String!
    description: String
    html_url: String!
    stargazers_count: Int!
    open_issues_count: Int
    owner: User
}

type User {
    login: String!
    avatar_url: String!
    html_url: String!
}

type Comment {
    id: Int!
    postedBy: User!
    createdAt: Float!
    content: String!
    repoName: String!
}

type Vote {
    vote_value: Int!
}
"#;

/// Star Wars schema with an interface and a union.
///
/// Useful for testing:
/// - Type conditions on `Character` and `SearchResult`
/// - Narrowing completeness (`Starship` is only reachable via the union)
/// - A missing subscription root
pub const STAR_WARS_SCHEMA: &str = r#"
type Query {
    hero(episode: Episode): Character
    character(id: ID!): Character
    human(id: ID!): Human
    droid(id: ID!): Droid
    search(text: String): [SearchResult]
}

type Mutation {
    createReview(episode: Episode, review: ReviewInput!): Review
}

enum Episode {
    NEWHOPE
    EMPIRE
    JEDI
}

interface Character {
    id: ID!
    name: String!
    friends: [Character]
    appearsIn: [Episode]!
}

type Human implements Character {
    id: ID!
    name: String!
    friends: [Character]
    appearsIn: [Episode]!
    homePlanet: String
    height: Float
    starships: [Starship]
}

type Droid implements Character {
    id: ID!
    name: String!
    friends: [Character]
    appearsIn: [Episode]!
    primaryFunction: String
}

type Starship {
    id: ID!
    name: String!
    length: Float
}

union SearchResult = Human | Droid | Starship

input ReviewInput {
    stars: Int!
    commentary: String
}

type Review {
    stars: Int!
    commentary: String
}
"#;

/// A fragment on `Entry` reused by several GitHunt documents.
pub const FEED_ENTRY_FRAGMENT: &str = r#"
fragment FeedEntry on Entry {
    id
    commentCount
    repository {
        full_name
        html_url
        owner {
            avatar_url
        }
    }
}
"#;
