use std::{path::PathBuf, process::exit, sync::Arc};

use anyhow::{bail, Result};
use clap::ArgMatches;
use dotenvy::dotenv;
use reedline::Signal;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod command_parser;
mod forms;
mod prompt;
mod repl;
mod server;

use milibro::{
    config::Config,
    lookup::{manual_form, CaptureState, Lookup, LookupOutcome, SearchQuery},
    session::{MemorySessionStore, SessionStore, SqliteSessionStore},
    shelf::BookFilter,
    traits::DisplayTerminal,
    types::{
        book::{BookForm, BookUpdate},
        isbn::Isbn,
        library::Shelf,
        rating::Rating,
        timestamp::ReadingDate,
    },
    ClientSettings, Error, Librarian, MilibroClient,
};

struct App<S> {
    config:    Config,
    librarian: Arc<Mutex<Librarian<S>>>,
}

async fn handle_command<S>(command: String, app: &App<S>) -> Result<()>
where
    S: SessionStore + Send + Sync + 'static,
{
    let args = command_parser::arg_parser();
    let Some(command) = shlex::split(&command) else {
        bail!("Invalid command");
    };
    if command.is_empty() {
        return Ok(());
    }
    let matches = args.try_get_matches_from(command)?;
    execute(&matches, app).await
}

/// Runs the lookup, giving up when Ctrl-C is pressed.
async fn lookup<S: SessionStore>(
    librarian: &mut Librarian<S>,
    capture: &CaptureState,
) -> Result<LookupOutcome> {
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };
    let outcome = librarian.lookup(capture, &cancel).await;
    watcher.abort();
    Ok(outcome?)
}

fn print_outcome(outcome: &LookupOutcome, query: &SearchQuery, config: &Config) {
    match outcome {
        LookupOutcome::Found { form, provider } => {
            println!(
                "{} {}",
                form.fmt_to_string(config),
                config.output_provider.format_str(provider)
            );
        }
        LookupOutcome::Choose(candidates) => {
            for (i, candidate) in candidates.iter().enumerate() {
                println!("{:>3}. {}", i + 1, candidate.fmt_to_string(config));
            }
        }
        LookupOutcome::NotFound { .. } => println!("No results for {query}."),
    }
}

/// Turns a lookup into the form the user gets to review.
fn resolve_form(outcome: LookupOutcome, query: &SearchQuery, config: &Config) -> Result<BookForm> {
    match outcome {
        LookupOutcome::Found { form, provider } => {
            println!("{}", config.output_provider.format_str(provider));
            Ok(form)
        }
        LookupOutcome::Choose(ref candidates) => {
            let chosen = forms::choose_candidate(candidates, config)?.and_then(|i| outcome.select(i));
            match chosen {
                Some(LookupOutcome::Found { form, .. }) => Ok(form),
                _ => Ok(manual_form(query)),
            }
        }
        LookupOutcome::NotFound { manual } => {
            println!("No results for {query}, please fill in the form.");
            Ok(manual)
        }
    }
}

async fn add<S: SessionStore>(
    librarian: &mut Librarian<S>,
    matches: &ArgMatches,
    config: &Config,
) -> Result<()> {
    let shelf = Shelf::from_wishlist(matches.get_flag("wishlist"));
    let mut capture = CaptureState::new();
    if let Some(isbn) = matches.get_one::<String>("isbn") {
        capture.set_isbn(isbn)?;
    }
    if let Some(title) = matches.get_many::<String>("title") {
        capture.set_title(&title.cloned().collect::<Vec<_>>().join(" "));
    }

    let form = if matches.get_flag("manual") {
        BookForm::default()
    } else {
        if capture.is_empty() {
            let input = inquire::Text::new("Title or ISBN:").prompt()?;
            if Isbn::is_valid(input.trim()) {
                capture.set_isbn(&input)?;
            } else {
                capture.set_title(&input);
            }
        }
        let Some(query) = capture.query() else {
            bail!("Nothing to search for");
        };
        let outcome = lookup(librarian, &capture).await?;
        resolve_form(outcome, &query, config)?
    };

    let form = forms::review_form(form)?;
    let book = librarian.save_new(form, shelf, &mut capture).await?;
    println!("Saved to the {shelf} shelf:");
    forms::print_book(&book, config);
    Ok(())
}

fn parse_date(matches: &ArgMatches, name: &str) -> Result<Option<ReadingDate>> {
    Ok(matches
        .get_one::<String>(name)
        .map(|s| ReadingDate::parse(s))
        .transpose()?)
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a String> {
    match matches.get_one::<String>(name) {
        Some(value) => Ok(value),
        None => bail!("Missing argument <{name}>"),
    }
}

async fn execute<S>(matches: &ArgMatches, app: &App<S>) -> Result<()>
where
    S: SessionStore + Send + Sync + 'static,
{
    let config = &app.config;
    if let Some(("scan-server", matches)) = matches.subcommand() {
        let save_to = matches
            .get_flag("add")
            .then(|| Shelf::from_wishlist(matches.get_flag("wishlist")));
        return server::start(app.librarian.clone(), save_to, config.scan_server_port).await;
    }

    let mut librarian = app.librarian.lock().await;
    match matches.subcommand() {
        Some(("login", matches)) => {
            let last_email = match matches.get_one::<String>("email") {
                Some(email) => Some(email.clone()),
                None => librarian.last_email().await?,
            };
            let (email, password) = forms::login(last_email.as_deref())?;
            let session = librarian.login(&email, &password).await?;
            println!("Logged in as {}.", session.user.display_name());
        }
        Some(("logout", _)) => {
            librarian.logout().await?;
            println!("Logged out.");
        }
        Some(("whoami", _)) => {
            let user = librarian.user()?;
            println!("{} <{}>", user.display_name(), user.email);
            if !user.image.is_empty() {
                println!("{}", user.image);
            }
        }
        Some(("shelf", matches)) => {
            let shelf: Shelf = required(matches, "shelf")?.parse()?;
            let filter: BookFilter = required(matches, "filter")?.parse()?;
            let search = matches.get_one::<String>("search").map_or("", String::as_str);
            let view = librarian.shelf(shelf).await?;
            for book in view.search(search).filter(|b| filter.matches(b)) {
                forms::print_book(book, config);
            }
            let stats = view.stats();
            println!(
                "{} books, {} favorites, {} reading, {} read",
                stats.total, stats.favorites, stats.reading, stats.read
            );
        }
        Some(("show", matches)) => {
            let book = librarian.find_book(required(matches, "id")?).await?;
            println!("{}", book.fmt_details(config));
        }
        Some(("search", matches)) => {
            let mut capture = CaptureState::new();
            match matches.subcommand() {
                Some(("isbn", matches)) => capture.set_isbn(required(matches, "isbn")?)?,
                Some(("title", matches)) => capture.set_title(
                    &matches
                        .get_many::<String>("title")
                        .map(|x| x.cloned().collect::<Vec<_>>().join(" "))
                        .unwrap_or_default(),
                ),
                Some((name, _)) => bail!("Unknown search {name}"),
                None => unreachable!("subcommand required"),
            }
            let Some(query) = capture.query() else {
                bail!("Nothing to search for");
            };
            let outcome = lookup(&mut librarian, &capture).await?;
            print_outcome(&outcome, &query, config);
        }
        Some(("add", matches)) => add(&mut librarian, matches, config).await?,
        Some(("rate", matches)) => {
            let rating = match matches.get_one::<i64>("rating") {
                Some(rating) => Rating::new(*rating)?,
                None => bail!("Missing argument <rating>"),
            };
            let update = BookUpdate::rating_only(
                rating,
                parse_date(matches, "start")?,
                parse_date(matches, "end")?,
            );
            let book = librarian.find_book(required(matches, "id")?).await?;
            let book = librarian.rate(&book, update).await?;
            forms::print_book(&book, config);
        }
        Some(("edit", matches)) => {
            let book = librarian.find_book(required(matches, "id")?).await?;
            let update = forms::edit_book(&book)?;
            let book = librarian.edit(&book, update).await?;
            forms::print_book(&book, config);
        }
        Some(("remove", matches)) => {
            let book = librarian.find_book(required(matches, "id")?).await?;
            forms::print_book(&book, config);
            if matches.get_flag("yes") || forms::confirm("Delete this book?")? {
                librarian.remove(&book.id).await?;
                println!("Deleted.");
            }
        }
        Some(("avatar", matches)) => {
            let path = match matches.get_one::<PathBuf>("path") {
                Some(path) => path,
                None => bail!("Missing argument <path>"),
            };
            let url = librarian.upload_avatar(path).await?;
            println!("New avatar: {url}");
        }
        Some(("profile", _)) => {
            let user = librarian.user()?.clone();
            let update = forms::profile(&user)?;
            let user = librarian.update_profile(update).await?;
            println!("Saved, hello {}.", user.display_name());
        }
        Some(("config", _)) => println!("{}", Config::default_as_string()?),
        Some(("exit", _)) => exit(0),
        Some(("repl", _)) => bail!("Already in the REPL"),
        Some((name, _)) => bail!("Unknown command {name}"),
        None => unreachable!("subcommand required"),
    }
    Ok(())
}

fn print_error(e: &anyhow::Error, config: &Config) {
    match e.downcast_ref::<Error>() {
        Some(Error::Validation(errors)) => {
            for field in &errors.0 {
                println!(
                    "{}",
                    config
                        .output_error
                        .format_str(format!("{}: {}", field.field, field.message))
                );
            }
        }
        Some(e) if e.is_auth() => {
            println!("{}", config.output_error.format_str(e));
            println!("Use `login` to log in.");
        }
        Some(e) if e.is_retryable() => {
            println!("{}", config.output_error.format_str(e));
            println!("Nothing was changed, you can try again.");
        }
        _ => println!("{}", config.output_error.format_str(e)),
    }
}

async fn run<S>(config: Config, mut librarian: Librarian<S>, matches: &ArgMatches) -> Result<()>
where
    S: SessionStore + Send + Sync + 'static,
{
    librarian.restore().await?;
    let app = App {
        config,
        librarian: Arc::new(Mutex::new(librarian)),
    };

    if let Some(("repl", _)) = matches.subcommand() {
        let mut repl = repl::Repl::new(
            command_parser::generate_completions(),
            app.config.history_file_path(),
        )?;
        loop {
            let user = app
                .librarian
                .lock()
                .await
                .user()
                .ok()
                .map(|u| u.display_name().to_string());
            repl.set_user(user);
            match repl.read_line() {
                Ok(Signal::Success(buffer)) => {
                    if let Err(e) = handle_command(buffer, &app).await {
                        print_error(&e, &app.config);
                    }
                }
                Ok(Signal::CtrlD) | Ok(Signal::CtrlC) => {
                    println!("\nAborted!");
                    break;
                }
                x => {
                    println!("Event: {:?}", x);
                }
            }
        }
        Ok(())
    } else if let Err(e) = execute(matches, &app).await {
        print_error(&e, &app.config);
        exit(1);
    } else {
        Ok(())
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => EnvFilter::try_from_env("MILIBRO_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    let matches = command_parser::arg_parser_cli().get_matches();
    init_tracing(matches.get_count("verbose"));

    let config = Config::read_config()?;
    let client = MilibroClient::new(ClientSettings::from_config(&config))?;
    let lookup = Lookup::new(config.provider_order.clone());

    if matches.get_flag("ephemeral") {
        let librarian = Librarian::new(client, MemorySessionStore::new(), lookup);
        run(config, librarian, &matches).await
    } else {
        let store = SqliteSessionStore::open(&config.session_database_path()).await?;
        run(config, Librarian::new(client, store, lookup), &matches).await
    }
}
