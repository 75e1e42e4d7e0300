use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use milibro::{
    lookup::{CaptureState, CatalogSearch, Lookup, LookupOutcome, ProviderOrder, SearchQuery},
    types::{
        catalog::{Provider, SearchBundle},
        isbn::Isbn,
    },
    Error, Result,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;

/// Answers every search with the same canned response.
struct Canned {
    response: fn() -> Result<SearchBundle>,
    delay:    Duration,
    calls:    AtomicUsize,
}

impl Canned {
    fn new(response: fn() -> Result<SearchBundle>) -> Self {
        Self {
            response,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    async fn answer(&self) -> Result<SearchBundle> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        (self.response)()
    }
}

impl CatalogSearch for Canned {
    async fn search_isbn(&self, _isbn: &Isbn) -> Result<SearchBundle> {
        self.answer().await
    }

    async fn search_title(&self, _title: &str) -> Result<SearchBundle> {
        self.answer().await
    }
}

fn bundle(value: serde_json::Value) -> Result<SearchBundle> {
    Ok(serde_json::from_value(value).unwrap())
}

fn both_providers() -> Result<SearchBundle> {
    bundle(json!({
        "googleBooks": { "title": "Dune (Google)", "authors": ["Frank Herbert"] },
        "openLibrary": {
            "title": "Dune",
            "authors": ["Frank Herbert"],
            "isbn": { "isbn_13": ["9780441013593"] },
            "publishedDate": "1990"
        }
    }))
}

fn isbn_query() -> SearchQuery {
    let mut capture = CaptureState::new();
    capture.set_isbn("9780441013593").unwrap();
    capture.query().unwrap()
}

async fn run(search: &Canned, order: ProviderOrder) -> Result<LookupOutcome> {
    Lookup::new(order)
        .run(search, &isbn_query(), &CancellationToken::new())
        .await
}

#[tokio::test]
async fn first_provider_in_order_wins() {
    let search = Canned::new(both_providers);

    match run(&search, ProviderOrder::default()).await.unwrap() {
        LookupOutcome::Found { form, provider } => {
            assert_eq!(provider, Provider::OpenLibrary);
            assert_eq!(form.title, "Dune");
            assert_eq!(form.isbn, "9780441013593");
            assert_eq!(form.publication_year, 1990);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let google_first = ProviderOrder(vec![Provider::GoogleBooks]);
    match run(&search, google_first).await.unwrap() {
        LookupOutcome::Found { form, provider } => {
            assert_eq!(provider, Provider::GoogleBooks);
            assert_eq!(form.title, "Dune (Google)");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(search.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn empty_results_give_a_manual_form() {
    let search = Canned::new(|| bundle(json!({ "googleBooks": [], "openLibrary": null })));

    match run(&search, ProviderOrder::default()).await.unwrap() {
        LookupOutcome::NotFound { manual } => {
            assert_eq!(manual.isbn, "9780441013593");
            assert_eq!(manual.title, "");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn several_matches_ask_for_a_choice() {
    let search = Canned::new(|| {
        bundle(json!({
            "googleBooks": [
                { "title": "Dune", "authors": ["Frank Herbert"] },
                { "title": "Dune Messiah", "authors": ["Frank Herbert"], "publishedDate": "1969" }
            ]
        }))
    });

    let outcome = run(&search, ProviderOrder::default()).await.unwrap();
    let LookupOutcome::Choose(candidates) = &outcome else {
        panic!("unexpected outcome: {outcome:?}");
    };
    assert_eq!(candidates.len(), 2);
    assert!(outcome.form().is_none());

    let picked = outcome.select(1).unwrap();
    let form = picked.form().unwrap();
    assert_eq!(form.title, "Dune Messiah");
    assert_eq!(form.publication_year, 1969);
    assert!(outcome.select(2).is_none());
}

#[tokio::test]
async fn transport_failures_give_a_manual_form() {
    let search = Canned::new(|| {
        Err(Error::Server {
            status:  502,
            message: "bad gateway".into(),
        })
    });
    assert!(matches!(
        run(&search, ProviderOrder::default()).await,
        Ok(LookupOutcome::NotFound { .. })
    ));

    let search = Canned::new(|| Err(Error::Parse("garbage".into())));
    assert!(matches!(
        run(&search, ProviderOrder::default()).await,
        Ok(LookupOutcome::NotFound { .. })
    ));
}

#[tokio::test]
async fn missing_login_is_passed_on() {
    let search = Canned::new(|| Err(Error::AuthRequired));
    assert!(matches!(
        run(&search, ProviderOrder::default()).await,
        Err(Error::AuthRequired)
    ));
}

#[tokio::test]
async fn cancelled_lookup_returns_promptly() {
    let search = Canned {
        delay: Duration::from_secs(30),
        ..Canned::new(both_providers)
    };
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        Lookup::new(ProviderOrder::default()).run(&search, &isbn_query(), &cancel),
    )
    .await
    .expect("lookup did not stop after cancellation");
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[tokio::test]
async fn empty_capture_has_no_query() {
    let mut capture = CaptureState::new();
    capture.set_title("   ");
    assert!(capture.query().is_none());
    assert!(capture.set_isbn("not an isbn").is_err());
    assert!(capture.is_empty());

    capture.set_isbn("9780441013593").unwrap();
    capture.set_title("Dune");
    assert_eq!(capture.query(), Some(SearchQuery::Title("Dune".into())));
}
