use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use media_organizer::config::Config;
use media_organizer::export::{export_items, ExportFormat};
use media_organizer::scanner::{item_from_path, Scanner};
use media_organizer::{filter_from_str, logging, Catalog, Filter, SortMode};

struct Args {
    config_path: Option<PathBuf>,
    catalog: Option<String>,
    verbose: bool,
    command: Vec<String>,
}

fn parse_args() -> Args {
    let argv: Vec<String> = std::env::args().collect();
    let mut args = Args {
        config_path: None,
        catalog: None,
        verbose: false,
        command: Vec::new(),
    };

    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("media-organizer {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--verbose" | "-v" => args.verbose = true,
            "--config" | "-c" => {
                args.config_path = Some(PathBuf::from(option_value(&argv, i, "--config")));
                i += 1;
            }
            "--catalog" | "-n" => {
                args.catalog = Some(option_value(&argv, i, "--catalog"));
                i += 1;
            }
            _ => {
                args.command = argv[i..].to_vec();
                break;
            }
        }
        i += 1;
    }

    args
}

fn option_value(argv: &[String], i: usize, flag: &str) -> String {
    match argv.get(i + 1) {
        Some(value) => value.clone(),
        None => {
            eprintln!("Error: {} requires an argument", flag);
            std::process::exit(1);
        }
    }
}

fn print_help() {
    println!(
        r#"media-organizer - tag and filter a local media catalog

USAGE:
    media-organizer [OPTIONS] <COMMAND>

OPTIONS:
    --config, -c PATH    Path to config file
    --catalog, -n NAME   Catalog name (default from config)
    --verbose, -v        Also log to stderr
    --version, -V        Show version
    --help, -h           Show this help message

COMMANDS:
    init                               Create an empty catalog (replaces any existing one)
    add PATH [--name N] [--description D]
    remove PATH
    scan DIR                           Add every media file under DIR
    tag-create NAME
    tag-delete NAME
    tag PATH TAG                       Attach TAG to PATH
    untag PATH TAG
    list [--sort FIELD] [--asc] [QUERY...]
                                       FIELD is modified, filename or size.
                                       QUERY words: #tag requires a tag, other
                                       words match part of the path (* and ?).
                                       Quote #tag words so the shell keeps them.
    tags [PATH]                        All tags, or the tags of PATH
    collections
    export FILE [--format json|csv] [QUERY...]
    discard                            Delete the catalog working file

ENVIRONMENT:
    MEDIA_ORGANIZER_CONFIG   Path to config file (overrides default location)
    MEDIA_ORGANIZER_LOG      Log level (trace, debug, info, warn, error)"#
    );
}

/// Options shared by `list` and `export`: sort flags, format, and query words.
struct ListingArgs {
    sort: SortMode,
    descending: bool,
    format: Option<ExportFormat>,
    query: Vec<String>,
}

fn parse_listing(rest: &[String], config: &Config) -> Result<ListingArgs> {
    let mut listing = ListingArgs {
        sort: config.listing.sort,
        descending: config.listing.descending,
        format: None,
        query: Vec::new(),
    };

    let mut i = 0;
    while i < rest.len() {
        match rest[i].as_str() {
            "--sort" => {
                let value = rest.get(i + 1).context("--sort requires a field")?;
                listing.sort = value.parse().map_err(anyhow::Error::msg)?;
                i += 1;
            }
            "--format" => {
                let value = rest.get(i + 1).context("--format requires a value")?;
                listing.format = Some(value.parse().map_err(anyhow::Error::msg)?);
                i += 1;
            }
            "--asc" => listing.descending = false,
            "--desc" => listing.descending = true,
            word => listing.query.push(word.to_string()),
        }
        i += 1;
    }

    Ok(listing)
}

fn listing_filter(query: &[String]) -> Option<Filter> {
    let filter = filter_from_str(&query.join(" "));
    (!filter.is_empty()).then_some(filter)
}

fn run(catalog: &Catalog, config: &Config, command: &[String]) -> Result<()> {
    let Some((name, rest)) = command.split_first() else {
        print_help();
        return Ok(());
    };

    match (name.as_str(), rest) {
        ("init", []) => {
            catalog.initialize_schema()?;
            println!("Created catalog at {}", catalog.working_path().display());
        }
        ("add", [path, options @ ..]) => {
            let mut item = item_from_path(std::path::Path::new(path))?;
            let mut i = 0;
            while i < options.len() {
                match (options[i].as_str(), options.get(i + 1)) {
                    ("--name", Some(value)) => item.name = Some(value.clone()),
                    ("--description", Some(value)) => item.description = Some(value.clone()),
                    (other, _) => bail!("Unexpected argument to add: {}", other),
                }
                i += 2;
            }
            catalog.add_item(&item)?;
        }
        ("remove", [path]) => catalog.remove_item(path)?,
        ("scan", [dir]) => {
            let result = Scanner::new(config.scanner.clone())
                .scan_directory(catalog, std::path::Path::new(dir))?;
            println!(
                "{} found, {} added, {} already catalogued",
                result.total_found, result.added, result.skipped
            );
        }
        ("tag-create", [tag]) => catalog.add_tag(tag)?,
        ("tag-delete", [tag]) => catalog.remove_tag(tag)?,
        ("tag", [path, tag]) => catalog.add_tag_to_item(path, tag)?,
        ("untag", [path, tag]) => catalog.remove_tag_from_item(path, tag)?,
        ("list", rest) => {
            let listing = parse_listing(rest, config)?;
            let filter = listing_filter(&listing.query);
            let items = catalog.list_items(filter.as_ref(), listing.sort, listing.descending)?;
            for item in items {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    item.path,
                    item.file_type,
                    item.size,
                    item.modified,
                    item.name.as_deref().unwrap_or("")
                );
            }
        }
        ("tags", []) => {
            for tag in catalog.list_all_tags()? {
                println!("{}", tag);
            }
        }
        ("tags", [path]) => {
            for tag in catalog.list_item_tags(path)? {
                println!("{}", tag);
            }
        }
        ("collections", []) => {
            for collection in catalog.list_collections()? {
                println!(
                    "{}\t{}",
                    collection.name,
                    collection.description.as_deref().unwrap_or("")
                );
            }
        }
        ("export", [file, rest @ ..]) => {
            let output = PathBuf::from(file);
            let listing = parse_listing(rest, config)?;
            let format = listing
                .format
                .unwrap_or_else(|| ExportFormat::from_path(&output));
            let filter = listing_filter(&listing.query);
            let items = catalog.list_items(filter.as_ref(), listing.sort, listing.descending)?;
            let count = export_items(&items, &output, format)?;
            println!(
                "Exported {} items as {} to {}",
                count,
                format.extension(),
                output.display()
            );
        }
        ("discard", []) => catalog.discard()?,
        (other, _) => bail!("Unknown command or wrong arguments: {} (see --help)", other),
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = parse_args();

    let _ = logging::init(Some(Config::config_dir().join("logs")), args.verbose);

    let config = match args.config_path {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let name = args.catalog.as_deref().unwrap_or(&config.catalog.name);
    let catalog = Catalog::open_in(&config.catalog.work_dir, name, None)
        .with_context(|| format!("Failed to open catalog {}", name))?;

    run(&catalog, &config, &args.command)
}
