use crate::CLAP_STYLING;
use clap::{arg, command};

/// Flags shared by every subcommand that runs a discovery crawl
fn discovery_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        arg!(<URL>)
            .required(true)
            .help("The documentation page to start from (https:// is assumed if no scheme is given)"),
    )
    .arg(
        arg!(-d --"depth" <DEPTH>)
            .required(false)
            .help("Link-hops to follow from the start page. 0 only reads links on the start page.")
            .value_parser(clap::value_parser!(usize))
            .default_value("0"),
    )
    .arg(
        arg!(-p --"parent" <LEVELS>)
            .required(false)
            .help("Widen the crawl scope by this many parent directories of the start URL")
            .value_parser(clap::value_parser!(usize))
            .default_value("0"),
    )
    .arg(
        arg!(-t --"workers" <NUM_WORKERS>)
            .required(false)
            .help("The number of pages fetched or converted concurrently")
            .value_parser(clap::value_parser!(usize))
            .default_value("4"),
    )
    .arg(
        arg!(--"timeout" <SECONDS>)
            .required(false)
            .help("Request timeout in seconds")
            .value_parser(clap::value_parser!(u64))
            .default_value("30"),
    )
    .arg(
        arg!(--"user-agent" <UA>)
            .required(false)
            .help("User-Agent header sent while crawling"),
    )
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("docmirror")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("docmirror")
        .about("Mirror a documentation site into a set of linked local markdown files")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress the banner and progress spinners").required(false))
        .arg(
            arg!(-v --"verbose" ...)
                .required(false)
                .help("Increase log verbosity (-v info, -vv debug)"),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            discovery_args(
                command!("list").about("Discover internal documentation links and print them"),
            )
            .arg(
                arg!(-f --"format" <FORMAT>)
                    .required(false)
                    .help("Report format: text, json")
                    .value_parser(["text", "json"])
                    .default_value("text"),
            )
            .arg(
                arg!(-o --"output" <PATH>)
                    .required(false)
                    .help("Save the link report to a file (default: print to screen)")
                    .value_parser(clap::value_parser!(std::path::PathBuf)),
            ),
        )
        .subcommand(
            discovery_args(
                command!("convert")
                    .about("Discover pages, convert them to markdown and rewrite links between them"),
            )
            .arg(
                arg!(--"api-key" <KEY>)
                    .required(false)
                    .help("Reader API key (default: JINA_AI_API_KEY from the environment or .env)"),
            )
            .arg(
                arg!(--"endpoint" <URL>)
                    .required(false)
                    .help("Reader API endpoint")
                    .default_value(docmirror_core::convert::DEFAULT_READER_ENDPOINT),
            )
            .arg(
                arg!(-o --"output" <DIR>)
                    .required(false)
                    .help("Directory the markdown pages are written to")
                    .value_parser(clap::value_parser!(std::path::PathBuf))
                    .default_value("output"),
            )
            .arg(
                arg!(--"combined" <FILE>)
                    .required(false)
                    .help("Also write every page into one aggregated markdown file")
                    .value_parser(clap::value_parser!(std::path::PathBuf)),
            ),
        )
}
