use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use inkpot::build::build_site;
use inkpot::config::Config;
use inkpot::macros::parse_macros;
use inkpot::render::render;
use std::path::Path;

const RENDER_USAGE: &str = "USAGE:
    inkpot render <template> <destination> [#key=value...] [$key=file_path...]

`#key=value` replaces every `key` with `value`; `$key=file_path` replaces every
`key` with the contents of `file_path`.";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let matches = App::new("inkpot")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds a static blog by substituting macros into HTML templates")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("render")
                .about("Renders a single template")
                .after_help(
                    "Each MACRO is either `#key=value`, which replaces every `key` with \
                     `value`, or `$key=file_path`, which replaces every `key` with the \
                     contents of `file_path`. Macros are applied in the order given.",
                )
                .arg(
                    Arg::with_name("template")
                        .help("The template file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::with_name("destination")
                        .help("The file to write the result to")
                        .required(true)
                        .index(2),
                )
                .arg(
                    Arg::with_name("macros")
                        .value_name("MACRO")
                        .help("A `#key=value` or `$key=file_path` macro")
                        .multiple(true)
                        .allow_hyphen_values(true)
                        .index(3),
                ),
        )
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site described by the nearest `inkpot.yaml`")
                .arg(
                    Arg::with_name("project")
                        .long("project")
                        .short("p")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("The directory to start searching for `inkpot.yaml` in"),
                )
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("The directory to write pages to (defaults to the project directory)"),
                ),
        )
        .get_matches();

    let status = match matches.subcommand() {
        ("render", Some(matches)) => render_command(matches),
        ("build", Some(matches)) => build_command(matches),
        _ => 1, // `SubcommandRequiredElseHelp` exits before we get here
    };
    std::process::exit(status);
}

fn render_command(matches: &ArgMatches) -> i32 {
    // Both positionals are required, so clap has already rejected their
    // absence.
    let template = matches.value_of("template").unwrap_or_default();
    let destination = matches.value_of("destination").unwrap_or_default();

    let macros = match parse_macros(matches.values_of("macros").into_iter().flatten()) {
        Ok(macros) => macros,
        Err(e) => {
            eprintln!("Could not parse macros: {}\n\n{}", e, RENDER_USAGE);
            return 1;
        }
    };

    match render(template, destination, &macros) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{}", e);
            1
        }
    }
}

fn build_command(matches: &ArgMatches) -> i32 {
    let project = Path::new(matches.value_of("project").unwrap_or("."));
    let output = matches.value_of("output").map(Path::new);

    let config = match Config::from_directory(project, output) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:#}", e);
            return 1;
        }
    };

    match build_site(&config) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("An error occurred building the pages: {}", e);
            1
        }
    }
}
