use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};
use storybase::{
    config::Config,
    error::Result,
    model::{ConnectedStory, Story},
    structure::{SectionsOptions, Structure, StructureRegistry, TocFormat},
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive, such as `storybase=debug`.
const LOG_ENV: &str = "STORYBASE_LOG";

fn main() -> Result<()> {
    let matches = command().get_matches();

    init_tracing(matches.get_flag("quiet"), matches.get_flag("verbose"))?;

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load_from_dir(env::current_dir()?)?,
    };
    let registry = StructureRegistry::from_config(&config.structure)?;

    match matches.subcommand() {
        Some(("flat", sub_matches)) => flat(sub_matches),
        Some(("toc", sub_matches)) => toc(sub_matches, &config, &registry),
        Some(("sections", sub_matches)) => sections(sub_matches),
        Some(("types", _)) => types(&registry),
        _ => unreachable!("a subcommand is required"),
    }
}

fn command() -> Command {
    let story_arg = || {
        Arg::new("story")
            .help("Story file (TOML, or JSON with a .json extension)")
            .required(true)
            .value_parser(value_parser!(PathBuf))
    };

    Command::new("sbstory")
        .about("Inspect the section structure of StoryBase stories")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("Path to storybase.toml, defaults to the one in the working directory")
                .global(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .global(true)
                .conflicts_with("verbose")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("flat")
                .about("Print sections in reading order with their previous and next sections")
                .arg(story_arg()),
        )
        .subcommand(
            Command::new("toc")
                .about("Render the table of contents of a story")
                .arg(story_arg())
                .arg(
                    Arg::new("format")
                        .long("format")
                        .value_parser(["html", "markdown", "md"])
                        .default_value("html"),
                )
                .arg(
                    Arg::new("type")
                        .long("type")
                        .value_name("ID")
                        .help("Structure type to use instead of the story's own"),
                ),
        )
        .subcommand(
            Command::new("sections")
                .about("Print the JSON section list used to bootstrap the story viewer")
                .arg(story_arg())
                .arg(
                    Arg::new("no-summary")
                        .long("no-summary")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no-call-to-action")
                        .long("no-call-to-action")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("all-connected")
                        .long("all-connected")
                        .help("Count unpublished connected stories too")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("types").about("List the registered structure types"))
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn load_story(matches: &ArgMatches) -> Result<Story> {
    let path = matches
        .get_one::<PathBuf>("story")
        .context("No story file given")?;

    debug!(path = %path.display(), "loading story");

    Story::load(path)
}

fn flat(matches: &ArgMatches) -> Result<()> {
    let story = load_story(matches)?;
    let structure = Structure::build(&story)?;

    for section in structure.sections_flat() {
        let previous = structure.previous_section(&section.section_id)?;
        let next = structure.next_section(&section.section_id)?;

        println!(
            "{}\t{}\t{}\t{}",
            section.section_id,
            previous.map_or("-", |section| section.section_id.as_str()),
            next.map_or("-", |section| section.section_id.as_str()),
            section.title
        );
    }

    Ok(())
}

fn toc(matches: &ArgMatches, config: &Config, registry: &StructureRegistry) -> Result<()> {
    let story = load_story(matches)?;
    let structure = Structure::build(&story)?;

    let structure_type = match matches.get_one::<String>("type") {
        Some(id) => registry.get(id)?,
        None => registry.resolve(&story)?,
    };
    let format: TocFormat = matches
        .get_one::<String>("format")
        .map_or(Ok(TocFormat::default()), |format| format.parse())?;

    debug!(structure_type = structure_type.id(), ?format, "rendering table of contents");

    let output = structure_type.render_toc(&structure, &config.toc, format)?;
    println!("{output}");

    Ok(())
}

fn sections(matches: &ArgMatches) -> Result<()> {
    let story = load_story(matches)?;
    let structure = Structure::build(&story)?;

    let options = SectionsOptions {
        include_summary: !matches.get_flag("no-summary"),
        include_call_to_action: !matches.get_flag("no-call-to-action"),
    };

    let connected: Option<Vec<ConnectedStory>> = matches.get_flag("all-connected").then(|| {
        story
            .connected_stories(false)
            .into_iter()
            .cloned()
            .collect()
    });

    let sections = structure.sections_json(options, connected.as_deref());
    println!("{}", serde_json::to_string_pretty(&sections)?);

    Ok(())
}

fn types(registry: &StructureRegistry) -> Result<()> {
    for (id, name) in registry.types() {
        let marker = if id == registry.default_type() { " (default)" } else { "" };
        println!("{id}\t{name}{marker}");
    }

    Ok(())
}
