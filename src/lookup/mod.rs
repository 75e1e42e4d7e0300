//! Turns a captured title or ISBN into a filled-in book form.
//!
//! One search request goes to the backend, which answers with whatever Google
//! Books and Open Library had. The first provider (in [ProviderOrder]) that
//! returned anything is used, the rest is dropped. When nobody had anything,
//! or the request failed, the caller gets an empty form to fill by hand.

pub mod capture;
pub mod dispatch;
pub mod reconcile;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use self::{
    capture::{CaptureState, SearchQuery},
    dispatch::{dispatch, CatalogSearch},
    reconcile::{map_candidate, reconcile, secure_image_url, ProviderOrder, Resolution},
};
use crate::{
    error::{Error, Result},
    types::{
        book::BookForm,
        catalog::{Candidate, Provider},
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found { form: BookForm, provider: Provider },
    /// Several matches for a title; pick one with [LookupOutcome::select].
    Choose(Vec<Candidate>),
    /// Nothing usable came back. `manual` is pre-filled with the query.
    NotFound { manual: BookForm },
}

impl LookupOutcome {
    fn found(candidate: &Candidate) -> Self {
        LookupOutcome::Found {
            form:     map_candidate(candidate),
            provider: candidate.provider(),
        }
    }

    /// The chosen entry of a [LookupOutcome::Choose] as if it had been the only result.
    pub fn select(&self, index: usize) -> Option<LookupOutcome> {
        match self {
            LookupOutcome::Choose(candidates) => candidates.get(index).map(Self::found),
            _ => None,
        }
    }

    pub fn form(&self) -> Option<&BookForm> {
        match self {
            LookupOutcome::Found { form, .. } => Some(form),
            LookupOutcome::NotFound { manual } => Some(manual),
            LookupOutcome::Choose(_) => None,
        }
    }
}

/// Empty entry form carrying whatever the user already typed or scanned.
pub fn manual_form(query: &SearchQuery) -> BookForm {
    match query {
        SearchQuery::Title(title) => BookForm {
            title: title.clone(),
            ..BookForm::default()
        },
        SearchQuery::Isbn(isbn) => BookForm {
            isbn: isbn.to_string(),
            ..BookForm::default()
        },
    }
}

#[derive(Debug, Clone, Default)]
pub struct Lookup {
    order: ProviderOrder,
}

impl Lookup {
    pub fn new(order: ProviderOrder) -> Self {
        Self { order }
    }

    pub fn order(&self) -> &ProviderOrder {
        &self.order
    }

    /// Transport and decoding failures count as "no results". Missing
    /// authentication and cancellation are passed on.
    pub async fn run<S>(
        &self,
        search: &S,
        query: &SearchQuery,
        cancel: &CancellationToken,
    ) -> Result<LookupOutcome>
    where
        S: CatalogSearch + Sync,
    {
        let bundle = match dispatch(search, query, cancel).await {
            Ok(bundle) => bundle,
            Err(e) if e.is_auth() || matches!(e, Error::Cancelled) => return Err(e),
            Err(
                e @ (Error::Request(_)
                | Error::Server { .. }
                | Error::Parse(_)
                | Error::NotFound { .. }),
            ) => {
                warn!(%query, error = %e, "search failed, falling back to manual entry");
                return Ok(LookupOutcome::NotFound {
                    manual: manual_form(query),
                });
            }
            Err(e) => return Err(e),
        };

        Ok(match reconcile(bundle, &self.order) {
            Resolution::Single(candidate) => {
                info!(%query, provider = %candidate.provider(), "found book");
                LookupOutcome::found(&candidate)
            }
            Resolution::Choose(candidates) => {
                info!(%query, count = candidates.len(), "several candidates");
                LookupOutcome::Choose(candidates)
            }
            Resolution::NotFound => {
                info!(%query, "no results");
                LookupOutcome::NotFound {
                    manual: manual_form(query),
                }
            }
        })
    }
}
