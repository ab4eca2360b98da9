mod common;

use serde_json::{Value, json};
use shelf_social::domain::repositories::LibraryRepository;

fn titles(json: &Value) -> Vec<String> {
    json.as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_books_by_author() {
    let app = common::spawn_app();
    let one = common::create_test_author(&app.store, "Author One").await;
    let two = common::create_test_author(&app.store, "Author Two").await;
    common::create_test_book(&app.store, "Beta Book", 2010, one.id).await;
    common::create_test_book(&app.store, "Alpha Book", 2000, one.id).await;
    common::create_test_book(&app.store, "Gamma Stories", 2005, two.id).await;

    let response = app
        .server
        .get("/api/catalog/books-by-author")
        .add_query_param("author", "Author One")
        .await;

    response.assert_status_ok();
    assert_eq!(
        titles(&response.json::<Value>()),
        ["Alpha Book", "Beta Book"]
    );
}

#[tokio::test]
async fn test_books_by_unknown_author() {
    let app = common::spawn_app();

    let response = app
        .server
        .get("/api/catalog/books-by-author")
        .add_query_param("author", "Nobody")
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_catalog_requires_name_parameter() {
    let app = common::spawn_app();

    let response = app.server.get("/api/catalog/books-by-author").await;
    response.assert_status_bad_request();

    let response = app
        .server
        .get("/api/catalog/library-books")
        .add_query_param("library", "   ")
        .await;
    response.assert_status_bad_request();
    assert_eq!(
        response.json::<Value>()["error"]["code"],
        "validation_error"
    );
}

#[tokio::test]
async fn test_library_books_and_librarian() {
    let app = common::spawn_app();
    let author = common::create_test_author(&app.store, "Author One").await;
    let held = common::create_test_book(&app.store, "Held", 2001, author.id).await;
    common::create_test_book(&app.store, "Not held", 2002, author.id).await;

    let library = app.store.create_library("Central").await.unwrap();
    app.store.add_book(library.id, held.id).await.unwrap();

    let response = app
        .server
        .get("/api/catalog/library-books")
        .add_query_param("library", "Central")
        .await;
    response.assert_status_ok();
    assert_eq!(titles(&response.json::<Value>()), ["Held"]);

    let response = app
        .server
        .get("/api/catalog/librarian")
        .add_query_param("library", "Central")
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["librarian"], Value::Null);

    app.store
        .assign_librarian(library.id, "Ada")
        .await
        .unwrap();

    let response = app
        .server
        .get("/api/catalog/librarian")
        .add_query_param("library", "Central")
        .await;
    let json = response.json::<Value>();
    assert_eq!(json["library"], json!({ "id": library.id, "name": "Central" }));
    assert_eq!(json["librarian"]["name"], "Ada");
}

#[tokio::test]
async fn test_unknown_library_is_not_found() {
    let app = common::spawn_app();

    app.server
        .get("/api/catalog/librarian")
        .add_query_param("library", "Nowhere")
        .await
        .assert_status_not_found();
}
