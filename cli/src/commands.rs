use clap::{ArgMatches, Command};

pub fn cli() -> Vec<Command> {
    vec![decode::cli(), export::cli(), info::cli(), list::cli()]
}

pub fn dispatch(matches: ArgMatches) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("decode", args)) => decode::exec(args),
        Some(("export", args)) => export::exec(args),
        Some(("info", args)) => info::exec(args),
        Some(("list", args)) => list::exec(args),
        _ => unreachable!(),
    }
}

pub mod decode;
pub mod export;
pub mod info;
pub mod list;
