use milibro::{
    lookup::{CaptureState, CatalogSearch, Lookup, LookupOutcome, ProviderOrder},
    types::{catalog::Provider, isbn::Isbn, library::Shelf},
    ClientSettings, Error, MilibroClient,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

async fn client(server: &MockServer, token: Option<&str>) -> MilibroClient {
    let client = MilibroClient::new(ClientSettings::new(server.uri())).unwrap();
    client.set_token(token.map(String::from)).await;
    client
}

fn dune_bundle() -> serde_json::Value {
    json!({
        "googleBooks": [{
            "title": "Dune",
            "authors": ["Frank Herbert"],
            "isbn": ["0441013597", "9780441013593"],
            "publishedDate": "1965-08-01",
            "categories": ["Fiction"],
            "imageLinks": { "thumbnail": "http://books.google.com/dune.jpg" }
        }],
        "openLibrary": {}
    })
}

#[tokio::test]
async fn isbn_search_sends_the_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/books/search/9780441013593"))
        .and(header("authorization", "Bearer jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(dune_bundle()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, Some("jwt")).await;
    let bundle = client
        .search_isbn(&Isbn::parse("9780441013593").unwrap())
        .await
        .unwrap();
    assert_eq!(bundle.google_books.len(), 1);
    assert!(bundle.open_library.is_empty());
}

#[tokio::test]
async fn title_search_is_url_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/books/search-title/Dune%20Messiah"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, None).await;
    let bundle = client.search_title("Dune Messiah").await.unwrap();
    assert!(bundle.is_empty());
}

#[tokio::test]
async fn title_lookup_fills_the_form() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/books/search-title/Dune"))
        .respond_with(ResponseTemplate::new(200).set_body_json(dune_bundle()))
        .mount(&server)
        .await;

    let client = client(&server, None).await;
    let mut capture = CaptureState::new();
    capture.set_title("Dune");
    let outcome = Lookup::new(ProviderOrder::default())
        .run(&client, &capture.query().unwrap(), &CancellationToken::new())
        .await
        .unwrap();

    match outcome {
        LookupOutcome::Found { form, provider } => {
            assert_eq!(provider, Provider::GoogleBooks);
            assert_eq!(form.title, "Dune");
            assert_eq!(form.author, "Frank Herbert");
            assert_eq!(form.isbn, "9780441013593");
            assert_eq!(form.publication_year, 1965);
            assert_eq!(form.genre, "Fiction");
            assert_eq!(form.image_url, "https://books.google.com/dune.jpg");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn failed_search_falls_back_to_manual_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/books/search/9780441013593"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = client(&server, None).await;
    let mut capture = CaptureState::new();
    capture.set_isbn("9780441013593").unwrap();
    let outcome = Lookup::new(ProviderOrder::default())
        .run(&client, &capture.query().unwrap(), &CancellationToken::new())
        .await
        .unwrap();

    match outcome {
        LookupOutcome::NotFound { manual } => assert_eq!(manual.isbn, "9780441013593"),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_provider_does_not_spoil_the_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/books/search/9780441013593"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "openLibrary": {
                "title": "Dune",
                "authors": ["Frank Herbert"],
                "isbn": { "isbn_13": ["9780441013593"] }
            },
            "googleBooks": { "title": "Dune", "imageLinks": "", "isbn": 9780441013593u64 }
        })))
        .mount(&server)
        .await;

    let client = client(&server, None).await;
    let mut capture = CaptureState::new();
    capture.set_isbn("9780441013593").unwrap();
    let outcome = Lookup::new(ProviderOrder::default())
        .run(&client, &capture.query().unwrap(), &CancellationToken::new())
        .await
        .unwrap();

    match outcome {
        LookupOutcome::Found { form, provider } => {
            assert_eq!(provider, Provider::OpenLibrary);
            assert_eq!(form.title, "Dune");
            assert_eq!(form.author, "Frank Herbert");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_maps_to_auth_required() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/library/user-1/false"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client(&server, Some("expired")).await;
    let err = client.library("user-1", Shelf::Owned).await.unwrap_err();
    assert!(matches!(err, Error::AuthRequired));
    assert!(err.is_auth());
}

#[tokio::test]
async fn missing_book_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/books/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client(&server, Some("jwt")).await;
    match client.delete_book("gone").await.unwrap_err() {
        Error::NotFound { resource, id } => {
            assert_eq!(resource, "book");
            assert_eq!(id, "gone");
        }
        e => panic!("unexpected error: {e}"),
    }
}

#[tokio::test]
async fn server_errors_carry_the_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/books/lib-1"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "message": "database down" })),
        )
        .mount(&server)
        .await;

    let client = client(&server, Some("jwt")).await;
    match client.books("lib-1").await.unwrap_err() {
        e @ Error::Server { .. } => {
            assert!(e.is_retryable());
            assert_eq!(e.to_string(), "Server error (500): database down");
        }
        e => panic!("unexpected error: {e}"),
    }
}

#[tokio::test]
async fn no_token_fails_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server, None).await;
    assert!(matches!(
        client.books("lib-1").await,
        Err(Error::AuthRequired)
    ));
}

#[tokio::test]
async fn login_stores_the_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_string_contains("ana@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "jwt",
            "user": {
                "_id": "user-1",
                "email": "ana@example.com",
                "name": null,
                "library": [{ "_id": "lib-1" }, "lib-2"]
            }
        })))
        .mount(&server)
        .await;

    let client = client(&server, None).await;
    let session = client.login(" ana@example.com ", "secret1").await.unwrap();
    assert_eq!(session.user.library, vec!["lib-1", "lib-2"]);
    assert_eq!(session.user.display_name(), "ana@example.com");
    assert_eq!(client.token().await.as_deref(), Some("jwt"));

    client.logout().await;
    assert!(!client.is_authenticated().await);
}

#[tokio::test]
async fn refused_login_is_auth_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Credenciales incorrectas"
        })))
        .mount(&server)
        .await;

    let client = client(&server, None).await;
    match client.login("ana@example.com", "wrong1").await.unwrap_err() {
        Error::AuthFailed(message) => assert_eq!(message, "Credenciales incorrectas"),
        e => panic!("unexpected error: {e}"),
    }
    assert!(!client.is_authenticated().await);
}

#[tokio::test]
async fn avatar_upload_is_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cloudinary/upload"))
        .and(header("authorization", "Bearer jwt"))
        .and(body_string_contains("name=\"userId\""))
        .and(body_string_contains("name=\"image\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "imageUrl": "http://res.cloudinary.com/me.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, Some("jwt")).await;
    let url = client
        .upload_avatar("user-1", b"not really a png".to_vec(), "me.png")
        .await
        .unwrap();
    assert_eq!(url, "https://res.cloudinary.com/me.png");
}
