use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    error::{Error, Result},
    lookup::capture::SearchQuery,
    types::{catalog::SearchBundle, isbn::Isbn},
};

/// The backend's two search endpoints.
pub trait CatalogSearch {
    fn search_isbn(&self, isbn: &Isbn) -> impl Future<Output = Result<SearchBundle>> + Send;

    fn search_title(&self, title: &str) -> impl Future<Output = Result<SearchBundle>> + Send;
}

/// Issues exactly one search request for `query`, abandoning it when `cancel` fires.
pub async fn dispatch<S>(
    search: &S,
    query: &SearchQuery,
    cancel: &CancellationToken,
) -> Result<SearchBundle>
where
    S: CatalogSearch + Sync,
{
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    debug!(%query, "dispatching search");
    let request = async {
        match query {
            SearchQuery::Isbn(isbn) => search.search_isbn(isbn).await,
            SearchQuery::Title(title) => search.search_title(title).await,
        }
    };
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = request => result,
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use super::*;

    #[derive(Default)]
    struct Recorder {
        isbn_calls:  AtomicUsize,
        title_calls: AtomicUsize,
        delay:       Option<Duration>,
    }

    impl CatalogSearch for Recorder {
        async fn search_isbn(&self, _isbn: &Isbn) -> Result<SearchBundle> {
            self.isbn_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(SearchBundle::default())
        }

        async fn search_title(&self, _title: &str) -> Result<SearchBundle> {
            self.title_calls.fetch_add(1, Ordering::SeqCst);
            Ok(SearchBundle::default())
        }
    }

    #[tokio::test]
    async fn one_request_per_query() {
        let search = Recorder::default();
        let cancel = CancellationToken::new();
        dispatch(&search, &SearchQuery::Title("Dune".into()), &cancel)
            .await
            .unwrap();
        assert_eq!(search.title_calls.load(Ordering::SeqCst), 1);
        assert_eq!(search.isbn_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let search = Recorder::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let isbn = Isbn::parse("9780441013593").unwrap();
        let result = dispatch(&search, &SearchQuery::Isbn(isbn), &cancel).await;
        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(search.isbn_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancelled_while_in_flight() {
        let search = Recorder {
            delay: Some(Duration::from_secs(30)),
            ..Recorder::default()
        };
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });
        let isbn = Isbn::parse("9780441013593").unwrap();
        let result = dispatch(&search, &SearchQuery::Isbn(isbn), &cancel).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
