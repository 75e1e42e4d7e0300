use clap::{value_parser, Arg, ArgAction, Command};

fn book_id() -> Arg {
    Arg::new("id").required(true).help("Book id, as shown by `shelf`")
}

/// Commands available both from the shell and inside the REPL.
pub fn arg_parser() -> Command {
    Command::new("milibro")
        .about("Personal library client")
        .multicall(true)
        .subcommand_required(true)
        .subcommand(
            Command::new("login")
                .about("Log in, the last used e-mail is suggested")
                .arg(Arg::new("email")),
        )
        .subcommand(Command::new("logout").about("Forget the stored session"))
        .subcommand(Command::new("whoami").about("Show the logged in user"))
        .subcommand(
            Command::new("shelf")
                .about("List the books on a shelf")
                .arg(
                    Arg::new("shelf")
                        .value_parser(["owned", "wishlist"])
                        .default_value("owned"),
                )
                .arg(
                    Arg::new("filter")
                        .long("filter")
                        .short('f')
                        .value_parser(["all", "favorites", "reading", "read"])
                        .default_value("all"),
                )
                .arg(
                    Arg::new("search")
                        .long("search")
                        .short('s')
                        .help("Only books whose title or author contains this text"),
                ),
        )
        .subcommand(
            Command::new("show")
                .about("Show everything about one book")
                .arg(book_id()),
        )
        .subcommand(
            Command::new("search")
                .about("Look a book up without saving it")
                .subcommand_required(true)
                .subcommand(Command::new("isbn").arg(Arg::new("isbn").required(true)))
                .subcommand(
                    Command::new("title").arg(
                        Arg::new("title")
                            .required(true)
                            .num_args(1..)
                            .trailing_var_arg(true),
                    ),
                ),
        )
        .subcommand(
            Command::new("add")
                .about("Look a book up, review it and save it")
                .arg(
                    Arg::new("wishlist")
                        .long("wishlist")
                        .short('w')
                        .action(ArgAction::SetTrue)
                        .help("Put the book on the wishlist instead of the owned shelf"),
                )
                .arg(Arg::new("isbn").long("isbn").conflicts_with("manual"))
                .arg(
                    Arg::new("title")
                        .long("title")
                        .num_args(1..)
                        .conflicts_with("manual"),
                )
                .arg(
                    Arg::new("manual")
                        .long("manual")
                        .action(ArgAction::SetTrue)
                        .help("Skip the lookup and fill the form by hand"),
                ),
        )
        .subcommand(
            Command::new("rate")
                .about("Rate a book and set its reading dates")
                .arg(book_id())
                .arg(
                    Arg::new("rating")
                        .required(true)
                        .value_parser(value_parser!(i64))
                        .allow_negative_numbers(true)
                        .help("0 to 5"),
                )
                .arg(Arg::new("start").long("start"))
                .arg(Arg::new("end").long("end")),
        )
        .subcommand(
            Command::new("edit")
                .about("Edit status, progress, notes and dates of a book")
                .arg(book_id()),
        )
        .subcommand(
            Command::new("remove")
                .about("Delete a book")
                .arg(book_id())
                .arg(
                    Arg::new("yes")
                        .long("yes")
                        .short('y')
                        .action(ArgAction::SetTrue)
                        .help("Don't ask for confirmation"),
                ),
        )
        .subcommand(
            Command::new("avatar")
                .about("Upload a new profile picture")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(Command::new("profile").about("Edit name, e-mail and password"))
        .subcommand(
            Command::new("scan-server")
                .about("Receive scanned ISBNs from a phone on the local network")
                .arg(
                    Arg::new("add")
                        .long("add")
                        .action(ArgAction::SetTrue)
                        .help("Save every book that was found"),
                )
                .arg(
                    Arg::new("wishlist")
                        .long("wishlist")
                        .short('w')
                        .action(ArgAction::SetTrue)
                        .requires("add"),
                ),
        )
        .subcommand(Command::new("config").about("Print the default configuration"))
        .subcommand(Command::new("exit").about("Leave the REPL"))
}

/// Entry point for the shell: global flags plus `repl`.
pub fn arg_parser_cli() -> Command {
    let mut cmd = Command::new("milibro")
        .about("Personal library client")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count)
                .global(true)
                .help("More logging, repeat for even more"),
        )
        .arg(
            Arg::new("ephemeral")
                .long("ephemeral")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Keep the session in memory only"),
        )
        .subcommand(Command::new("repl").about("Launch a read eval print loop"));
    for subcmd in arg_parser().get_subcommands() {
        cmd = cmd.subcommand(subcmd.clone());
    }
    cmd
}

pub fn generate_completions() -> Vec<String> {
    let cmd = arg_parser();
    fn add_command(parent_fn_name: &str, cmd: &Command, subcmds: &mut Vec<String>) {
        let fn_name = format!("{parent_fn_name} {}", cmd.get_name())
            .trim()
            .to_string();
        subcmds.push(fn_name.clone());
        for subcmd in cmd.get_subcommands() {
            add_command(&fn_name, subcmd, subcmds);
        }
    }
    let mut subcmds = vec![];
    for subcmd in cmd.get_subcommands() {
        add_command("", subcmd, &mut subcmds);
    }
    subcmds.sort();
    subcmds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsers_are_consistent() {
        arg_parser().debug_assert();
        arg_parser_cli().debug_assert();
    }

    #[test]
    fn completions_include_nested_commands() {
        let completions = generate_completions();
        assert!(completions.contains(&"search title".to_string()));
        assert!(completions.contains(&"add".to_string()));
    }

    #[test]
    fn parses_repl_lines() {
        let matches = arg_parser()
            .try_get_matches_from(["rate", "abc123", "4", "--start", "2024-03-01"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "rate");
        assert_eq!(sub.get_one::<i64>("rating"), Some(&4));
        assert!(arg_parser()
            .try_get_matches_from(["add", "--isbn", "1", "--manual"])
            .is_err());
    }

    #[test]
    fn global_flags_on_the_shell() {
        let matches = arg_parser_cli()
            .try_get_matches_from(["milibro", "-vv", "shelf", "wishlist"])
            .unwrap();
        assert_eq!(matches.get_count("verbose"), 2);
        let (_, sub) = matches.subcommand().unwrap();
        assert_eq!(sub.get_one::<String>("shelf").map(String::as_str), Some("wishlist"));
    }

    #[test]
    fn shelf_search_text() {
        let matches = arg_parser()
            .try_get_matches_from(["shelf", "-f", "reading", "--search", "herbert"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        assert_eq!(sub.get_one::<String>("search").map(String::as_str), Some("herbert"));
        assert_eq!(sub.get_one::<String>("filter").map(String::as_str), Some("reading"));
    }
}
