//! In-process stand-in for the milibro backend, keeping books in memory.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use milibro::{
    types::{
        book::{Book, BookUpdate, NewBook},
        library::Library,
        user::{LoginRequest, Session, User},
    },
    ClientSettings, MilibroClient,
};
use tokio::sync::Mutex;

pub const EMAIL: &str = "ana@example.com";
pub const PASSWORD: &str = "secret1";
pub const TOKEN: &str = "test-token";
pub const USER_ID: &str = "user-1";
pub const OWNED_LIBRARY: &str = "lib-owned";
pub const WISHLIST_LIBRARY: &str = "lib-wishlist";

#[derive(Default)]
pub struct FakeBackend {
    pub books:   Mutex<Vec<Book>>,
    next_id:     Mutex<u32>,
    pub created: Mutex<Vec<NewBook>>,
}

type Reply<T> = Result<Json<T>, StatusCode>;

fn authorize(headers: &HeaderMap) -> Result<(), StatusCode> {
    let expected = format!("Bearer {TOKEN}");
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

async fn login(Json(request): Json<LoginRequest>) -> Reply<Session> {
    if request.email != EMAIL || request.password != PASSWORD {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(Session {
        access_token: TOKEN.into(),
        user:         User {
            id: USER_ID.into(),
            email: EMAIL.into(),
            name: "Ana".into(),
            role: "user".into(),
            library: vec![OWNED_LIBRARY.into(), WISHLIST_LIBRARY.into()],
            ..User::default()
        },
    }))
}

async fn library(
    headers: HeaderMap,
    Path((user, wishlist)): Path<(String, bool)>,
) -> Reply<Library> {
    authorize(&headers)?;
    if user != USER_ID {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(Library {
        id: if wishlist { WISHLIST_LIBRARY } else { OWNED_LIBRARY }.into(),
        wishlist,
        user,
    }))
}

async fn list_books(
    headers: HeaderMap,
    State(state): State<Arc<FakeBackend>>,
    Path(library): Path<String>,
) -> Reply<Vec<Book>> {
    authorize(&headers)?;
    let books = state.books.lock().await;
    Ok(Json(
        books
            .iter()
            .filter(|b| b.library == library)
            .cloned()
            .collect(),
    ))
}

async fn create_book(
    headers: HeaderMap,
    State(state): State<Arc<FakeBackend>>,
    Json(payload): Json<NewBook>,
) -> Result<(StatusCode, Json<Book>), StatusCode> {
    authorize(&headers)?;
    let id = {
        let mut next_id = state.next_id.lock().await;
        *next_id += 1;
        format!("book-{next_id}")
    };
    state.created.lock().await.push(payload.clone());
    let book = payload.into_book(id);
    state.books.lock().await.push(book.clone());
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    headers: HeaderMap,
    State(state): State<Arc<FakeBackend>>,
    Path(id): Path<String>,
    Json(update): Json<BookUpdate>,
) -> Reply<Book> {
    authorize(&headers)?;
    let mut books = state.books.lock().await;
    let book = books
        .iter_mut()
        .find(|b| b.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    update.apply(book);
    Ok(Json(book.clone()))
}

async fn delete_book(
    headers: HeaderMap,
    State(state): State<Arc<FakeBackend>>,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    authorize(&headers)?;
    let mut books = state.books.lock().await;
    let before = books.len();
    books.retain(|b| b.id != id);
    if books.len() == before {
        Err(StatusCode::NOT_FOUND)
    } else {
        Ok(StatusCode::OK)
    }
}

/// Starts the fake backend on a free local port and returns its base URL.
pub async fn spawn_backend() -> (String, Arc<FakeBackend>) {
    let state = Arc::new(FakeBackend::default());
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/library/:user/:wishlist", get(library))
        .route("/books", post(create_book))
        .route(
            "/books/:id",
            get(list_books)
                .patch(update_book)
                .put(update_book)
                .delete(delete_book),
        )
        .with_state(state.clone());

    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let server = axum::Server::bind(&addr).serve(app.into_make_service());
    let addr = server.local_addr();
    tokio::spawn(server);
    (format!("http://{addr}"), state)
}

pub fn client(url: &str) -> MilibroClient {
    MilibroClient::new(ClientSettings::new(url)).unwrap()
}
