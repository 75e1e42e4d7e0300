use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use local_ip_address::local_ip;
use milibro::{
    lookup::{CaptureState, LookupOutcome},
    session::SessionStore,
    types::library::Shelf,
    Error, Librarian,
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Scanned books are looked up and, when `save_to` is set, saved to that shelf.
pub struct ScanState<S> {
    librarian: Arc<Mutex<Librarian<S>>>,
    save_to:   Option<Shelf>,
}

pub async fn start<S>(
    librarian: Arc<Mutex<Librarian<S>>>,
    save_to: Option<Shelf>,
    port: u16,
) -> anyhow::Result<()>
where
    S: SessionStore + Send + Sync + 'static,
{
    let state = Arc::new(ScanState { librarian, save_to });

    let app = Router::new()
        .route("/api/isbn", get(isbn_query::<S>))
        .route("/api/isbn/:isbn", get(isbn::<S>))
        .with_state(state);

    let ip = local_ip()?;
    let addr = SocketAddr::from((ip, port));
    info!("Listening on {ip}:{port}.");
    println!("Send scans to http://{ip}:{port}/api/isbn/<isbn>, Ctrl-C to stop.");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

async fn handle<S>(scanned: &str, state: &ScanState<S>) -> Result<String, (StatusCode, String)>
where
    S: SessionStore + Send + Sync,
{
    info!("Received {scanned}.");
    let mut capture = CaptureState::new();
    if let Err(e) = capture.set_isbn(scanned) {
        warn!("{scanned} is not an isbn.");
        return Err((StatusCode::BAD_REQUEST, e.to_string()));
    }

    let mut librarian = state.librarian.lock().await;
    let outcome = librarian
        .lookup(&capture, &CancellationToken::new())
        .await
        .map_err(failure)?;
    let form = match outcome {
        LookupOutcome::Found { form, provider } => {
            info!(title = %form.title, %provider, "found {scanned}");
            form
        }
        LookupOutcome::Choose(candidates) => {
            info!(count = candidates.len(), "{scanned} is ambiguous");
            return Ok(format!(
                "{} matches for {scanned}, add it from the terminal.",
                candidates.len()
            ));
        }
        LookupOutcome::NotFound { .. } => {
            info!("Nothing found for {scanned}.");
            return Err((StatusCode::NOT_FOUND, format!("Nothing found for {scanned}.")));
        }
    };

    match state.save_to {
        Some(shelf) => {
            let book = librarian
                .save_new(form, shelf, &mut capture)
                .await
                .map_err(failure)?;
            info!(id = %book.id, "Handling of {scanned} complete.");
            Ok(format!("Saved \"{}\" to the {shelf} shelf.", book.title))
        }
        None => Ok(format!("Found \"{}\".", form.title)),
    }
}

fn failure(e: Error) -> (StatusCode, String) {
    error!(error = %e, "Handling of scan failed.");
    let status = match &e {
        Error::AuthRequired | Error::AuthFailed(_) => StatusCode::UNAUTHORIZED,
        Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, e.to_string())
}

async fn isbn<S>(
    Path(isbn): Path<String>,
    State(state): State<Arc<ScanState<S>>>,
) -> Result<String, (StatusCode, String)>
where
    S: SessionStore + Send + Sync + 'static,
{
    handle(&isbn, &state).await
}

async fn isbn_query<S>(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<ScanState<S>>>,
) -> Result<String, (StatusCode, String)>
where
    S: SessionStore + Send + Sync + 'static,
{
    match params.get("content") {
        Some(isbn) => handle(isbn, &state).await,
        None => Err((StatusCode::BAD_REQUEST, "Missing content parameter.".into())),
    }
}
