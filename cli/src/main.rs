use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{debug, info};
use std::fs;
use std::process::ExitCode;

use graphopt_core::{GraphoptErrorExt, InvalidInputError, OptConfig, Resources, optimize};

mod output;
mod program;

use output::FormatStyle;
use program::Program;

fn main() -> ExitCode {
    let cli = Command::new("graphopt")
        .version("0.1.0")
        .about("Common subexpression and dead data elimination over graph IR programs");

    let cli = setup_cli(cli);
    let matches = cli.get_matches();
    init_logging(matches.get_count("verbose"));

    let style = FormatStyle::default();
    match dispatch_commands(&matches, &style) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", output::error_line(&style, e.as_ref()));
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins over `-v`; each `-v` raises the default level by one.
fn init_logging(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

/// Sets up the CLI with subcommands and arguments.
fn setup_cli(cli: Command) -> Command {
    cli.arg(
        Arg::new("verbose")
            .help("Increase log verbosity (-v info, -vv debug, -vvv trace)")
            .short('v')
            .long("verbose")
            .action(ArgAction::Count)
            .global(true),
    )
    .subcommand(
        Command::new("opt")
            .about("Optimize a program and print the result")
            .arg(
                Arg::new("file")
                    .help("The JSON program to optimize")
                    .required(true)
                    .index(1),
            )
            .arg(
                Arg::new("config")
                    .help("JSON optimizer configuration")
                    .short('c')
                    .long("config")
                    .value_parser(clap::value_parser!(String))
                    .value_name("FILE"),
            )
            .arg(
                Arg::new("passes")
                    .help("Comma separated passes to run, overriding the configuration")
                    .short('p')
                    .long("passes")
                    .value_parser(clap::value_parser!(String))
                    .value_name("LIST"),
            )
            .arg(
                Arg::new("dump")
                    .help("Which graphs to print")
                    .short('d')
                    .long("dump")
                    .value_parser(["before", "after", "both"])
                    .default_value("after")
                    .value_name("STAGE"),
            )
            .arg(
                Arg::new("output")
                    .help("Write the optimized graphs to a file instead of stdout")
                    .short('o')
                    .long("output")
                    .value_parser(clap::value_parser!(String))
                    .value_name("FILE"),
            ),
    )
    .subcommand(
        Command::new("check")
            .about("Load a program and print its graphs without optimizing")
            .arg(
                Arg::new("file")
                    .help("The JSON program to check")
                    .required(true)
                    .index(1),
            ),
    )
}

/// Dispatches the command based on the parsed arguments.
fn dispatch_commands(
    matches: &ArgMatches,
    style: &FormatStyle,
) -> Result<(), Box<dyn GraphoptErrorExt>> {
    match matches.subcommand() {
        Some(("opt", sub_m)) => run_opt(sub_m, style),
        Some(("check", sub_m)) => run_check(sub_m, style),
        _ => Err(InvalidInputError::new("no subcommand given, see --help", "graphopt.cli").boxed()),
    }
}

fn required_file(sub_m: &ArgMatches) -> Result<&String, Box<dyn GraphoptErrorExt>> {
    sub_m
        .get_one::<String>("file")
        .ok_or_else(|| InvalidInputError::new("missing program file", "graphopt.cli").boxed())
}

fn run_check(sub_m: &ArgMatches, style: &FormatStyle) -> Result<(), Box<dyn GraphoptErrorExt>> {
    let file = required_file(sub_m)?;
    let program = Program::load_from_file(file)?;
    info!("loaded {} graph(s) from {}", program.graphs.len(), file);

    for g in program.graphs.iter() {
        println!("{}", program.manager.display_graph_typed(*g));
    }
    let root = program.manager.graph(program.root).name.clone();
    println!("{}", style.success.apply_to(format!("ok: root is {}", root)));
    Ok(())
}

fn run_opt(sub_m: &ArgMatches, style: &FormatStyle) -> Result<(), Box<dyn GraphoptErrorExt>> {
    let file = required_file(sub_m)?;
    let program = Program::load_from_file(file)?;

    let mut config = match sub_m.get_one::<String>("config") {
        Some(path) => OptConfig::load_from_file(path)?,
        None => OptConfig::default(),
    };
    if let Some(list) = sub_m.get_one::<String>("passes") {
        config.passes = OptConfig::parse_pass_list(list)?;
    }
    debug!("config: {:?}", config);

    let dump = sub_m.get_one::<String>("dump").map(String::as_str).unwrap_or("after");
    let root = program.root;
    if dump == "before" || dump == "both" {
        println!("{}", style.title.apply_to("before"));
        println!("{}", output::dump_graphs(&program.manager, root));
    }

    let mut res = Resources::new(program.manager, config);
    let report = optimize(&mut res, root)?;
    let optimized = output::dump_graphs(&res.manager, root);

    if dump == "after" || dump == "both" {
        match sub_m.get_one::<String>("output") {
            Some(path) => {
                fs::write(path, &optimized).map_err(|e| {
                    InvalidInputError::new(format!("write {}: {}", path, e), "graphopt.cli").boxed()
                })?;
                println!("{}", style.info.apply_to(format!("wrote {}", path)));
            }
            None => {
                println!("{}", style.title.apply_to("after"));
                println!("{}", optimized);
            }
        }
    }

    println!("{}", output::rounds_table(&report));
    println!("{}", output::summary_line(style, &report));
    Ok(())
}
