use milibro::{
    session::{SessionStore, SqliteSessionStore},
    types::user::{Session, User},
};
use pretty_assertions::assert_eq;

fn session() -> Session {
    Session {
        access_token: "jwt".into(),
        user:         User {
            id: "user-1".into(),
            email: "ana@example.com".into(),
            name: "Ana".into(),
            library: vec!["lib-1".into(), "lib-2".into()],
            ..User::default()
        },
    }
}

#[tokio::test]
async fn session_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("session.db");

    let store = SqliteSessionStore::open(&path).await.unwrap();
    assert_eq!(store.load().await.unwrap(), None);
    store.save(&session()).await.unwrap();
    store.remember_email("ana@example.com").await.unwrap();
    drop(store);

    let store = SqliteSessionStore::open(&path).await.unwrap();
    assert_eq!(store.load().await.unwrap(), Some(session()));
    assert_eq!(
        store.last_email().await.unwrap().as_deref(),
        Some("ana@example.com")
    );
}

#[tokio::test]
async fn clearing_keeps_the_last_email() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteSessionStore::open(&dir.path().join("session.db"))
        .await
        .unwrap();

    store.save(&session()).await.unwrap();
    store.remember_email("ana@example.com").await.unwrap();
    store.clear().await.unwrap();

    assert_eq!(store.load().await.unwrap(), None);
    assert_eq!(
        store.last_email().await.unwrap().as_deref(),
        Some("ana@example.com")
    );
}

#[tokio::test]
async fn saving_twice_replaces_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteSessionStore::open(&dir.path().join("session.db"))
        .await
        .unwrap();

    store.save(&session()).await.unwrap();
    let mut renamed = session();
    renamed.user.name = "Ana María".into();
    store.save(&renamed).await.unwrap();

    assert_eq!(store.load().await.unwrap(), Some(renamed));
}
