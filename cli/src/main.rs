use clap::{ArgAction, Command, arg, crate_name, crate_version};

mod cli;
mod commands;

fn app() -> Command {
    Command::new(crate_name!())
        .version(crate_version!())
        .arg_required_else_help(true)
        .arg(
            arg!(-v --verbose "Report progress on standard error (repeat for more detail)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommands(commands::cli())
}

fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn real_main() -> anyhow::Result<()> {
    let matches = app().get_matches();
    init_logger(matches.get_count("verbose"));

    commands::dispatch(matches)
}

fn main() {
    if let Err(ref e) = real_main() {
        let red = console::Style::new().red();
        eprintln!("{}: {}", red.apply_to("error"), e);
        std::process::exit(1);
    }
}
