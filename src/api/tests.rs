//! Runs real GraphQL documents against the schema, backed by the memory store.

use std::sync::Arc;

use juniper::{graphql_value, DefaultScalarValue, ExecutionError, Value, Variables};

use crate::{
    model::input::{CreatePostInput, CreateUserInput},
    resolver::{self, fixtures},
    store::memory::MemoryStore,
};
use super::{root_node, Context};


type Outcome = (Value<DefaultScalarValue>, Vec<ExecutionError<DefaultScalarValue>>);

async fn run(store: &Arc<MemoryStore>, doc: &str) -> Outcome {
    let context = Context::new(store.clone());
    juniper::execute(doc, None, &root_node(), &Variables::new(), &context)
        .await
        .expect("query failed to validate")
}

/// Creates the user "Ann" with a post "Ann's trip". Returns both ids.
async fn seed(store: &Arc<MemoryStore>) -> (String, String) {
    let ann = resolver::create_user(&**store, CreateUserInput {
        name: "Ann".into(),
        email: "ann@example.org".into(),
    }).await.unwrap();
    let trip = resolver::create_post(&**store, CreatePostInput {
        title: "Ann's trip".into(),
        content: None,
        status: None,
        author_id: ann.id.clone().into(),
        tag_ids: None,
        category_ids: None,
    }).await.unwrap();
    (ann.id, trip.id)
}

#[tokio::test]
async fn search_lists_user_then_post() {
    let store = Arc::new(MemoryStore::new());
    seed(&store).await;

    let (data, errors) = run(&store, r#"{
        search(text: "Ann") {
            __typename
            ... on User { name }
            ... on Post { title }
        }
    }"#).await;

    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(data, graphql_value!({
        "search": [
            { "__typename": "User", "name": "Ann" },
            { "__typename": "Post", "title": "Ann's trip" }
        ]
    }));
}

#[tokio::test]
async fn search_for_empty_text_is_an_empty_list() {
    let store = Arc::new(MemoryStore::new());
    seed(&store).await;

    let (data, errors) = run(&store, r#"{ search(text: "") { __typename } }"#).await;
    assert!(errors.is_empty());
    assert_eq!(data, graphql_value!({ "search": [] }));
}

#[tokio::test]
async fn created_tag_lists_its_posts() {
    let store = Arc::new(MemoryStore::new());
    let (_, trip) = seed(&store).await;

    let create = format!(r#"mutation {{
        createTag(input: {{ name: "go", postIds: ["{trip}"] }}) {{ name posts {{ id }} }}
    }}"#);
    let (data, errors) = run(&store, &create).await;
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(data, graphql_value!({
        "createTag": { "name": "go", "posts": [{ "id": (trip.as_str()) }] }
    }));

    let (data, errors) = run(&store, "{ getTags { name posts { title tags { name } } } }").await;
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(data, graphql_value!({
        "getTags": [{
            "name": "go",
            // Nested records are one level deep: their relations are empty.
            "posts": [{ "title": "Ann's trip", "tags": [] }]
        }]
    }));
}

#[tokio::test]
async fn node_resolves_kind_or_null() {
    let store = Arc::new(MemoryStore::new());
    let (ann, trip) = seed(&store).await;

    let doc = format!(r#"{{
        user: node(id: "{ann}") {{ __typename id }}
        post: node(id: "{trip}") {{ __typename ... on Post {{ author {{ name }} }} }}
        nothing: node(id: "does-not-exist") {{ id }}
    }}"#);
    let (data, errors) = run(&store, &doc).await;

    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(data, graphql_value!({
        "user": { "__typename": "User", "id": (ann.as_str()) },
        "post": { "__typename": "Post", "author": { "name": "Ann" } },
        "nothing": null
    }));
}

#[tokio::test]
async fn node_typename_follows_the_kind() {
    let store = Arc::new(MemoryStore::new());
    let ids = fixtures::one_of_each_kind(&*store).await.unwrap();

    for (kind, id) in ids {
        let doc = format!(r#"{{ node(id: "{id}") {{ __typename id }} }}"#);
        let (data, errors) = run(&store, &doc).await;
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(data, graphql_value!({
            "node": { "__typename": (kind.name()), "id": (id.as_str()) }
        }));
    }
}

#[tokio::test]
async fn missing_records_are_null_for_queries() {
    let store = Arc::new(MemoryStore::new());

    let (data, errors) = run(&store, r#"{
        getUser(id: "x") { id }
        getMessagesSent(userId: "x") { id }
    }"#).await;
    assert!(errors.is_empty());
    assert_eq!(data, graphql_value!({ "getUser": null, "getMessagesSent": [] }));
}

#[tokio::test]
async fn mutation_errors_carry_their_kind() {
    let store = Arc::new(MemoryStore::new());
    seed(&store).await;

    let (_, errors) = run(&store, r#"mutation {
        updateUser(id: "ghost", input: { name: "Nobody" }) { id }
    }"#).await;
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].error().extensions(),
        &graphql_value!({ "kind": "NOT_FOUND", "key": "record.not-found" }),
    );

    let (_, errors) = run(&store, r#"mutation {
        createPost(input: { title: "Orphan", authorId: "nobody" }) { id }
    }"#).await;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error().extensions(), &graphql_value!({ "kind": "INVALID_INPUT" }));

    let (_, errors) = run(&store, r#"mutation {
        createCategory(input: { name: "misc", postIds: ["missing"] }) { id }
    }"#).await;
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].error().extensions(),
        &graphql_value!({ "kind": "PARTIAL_FAILURE", "key": "record.partial-write" }),
    );
}

#[tokio::test]
async fn notifications_expose_type_field() {
    let store = Arc::new(MemoryStore::new());
    let (ann, _) = seed(&store).await;

    let doc = format!(r#"mutation {{
        createNotification(input: {{ type: "WELCOME", content: "Hi!", userId: "{ann}" }}) {{
            type read user {{ name }}
        }}
    }}"#);
    let (data, errors) = run(&store, &doc).await;
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(data, graphql_value!({
        "createNotification": { "type": "WELCOME", "read": false, "user": { "name": "Ann" } }
    }));
}

#[test]
fn schema_declares_node_interface_and_search_union() {
    let sdl = root_node().as_sdl();
    assert!(sdl.contains("interface Node"));
    assert!(sdl.contains("union SearchResult"));
    assert!(sdl.contains("type Query"));
}
