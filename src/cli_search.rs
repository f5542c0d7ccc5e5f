use anyhow::Result;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use componentry_catalog_server::catalog::{builtin_snapshot, load_catalog, Component};
use componentry_catalog_server::search::{CatalogSearchEngine, SearchFilters};

fn parse_root_dir(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s).canonicalize()?;
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Catalog directory. Without it the built-in component set is searched.
    #[clap(value_parser = parse_root_dir)]
    pub path: Option<PathBuf>,
}

fn print_result(component: &Component) {
    println!(
        "{} [{}] ({:?}) - {}",
        component.name, component.category, component.difficulty, component.id,
    );
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    let snapshot = match cli_args.path {
        Some(path) => {
            println!("Cli Search loading catalog at {}...", path.display());
            load_catalog(path)?
        }
        None => builtin_snapshot(),
    };

    let mut engine = CatalogSearchEngine::new(64, Duration::from_secs(300), None)?;
    engine.install_snapshot(snapshot);
    println!("Done, {} components indexed.", engine.component_count());

    loop {
        println!("Please enter your search query:");

        let mut user_input = String::new();

        io::stdin()
            .read_line(&mut user_input)
            .expect("Failed to read line");

        let user_input = user_input.trim();
        if user_input.is_empty() {
            continue;
        }

        let filters = SearchFilters {
            limit: Some(50),
            ..SearchFilters::default()
        };
        let (page, _) = engine.search(user_input, &filters)?;
        if page.components.is_empty() {
            println!("No matches found for \"{}\".", user_input);
        } else {
            println!(
                "Found {} matches for \"{}\":\n",
                page.total, user_input
            );
            for component in &page.components {
                print_result(component);
            }
        }
        println!("\n");
    }
}
