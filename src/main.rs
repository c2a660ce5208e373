use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use trix::index::{IndexConfig, SearchIndex, build_index};
use trix::output;

#[derive(Parser)]
#[command(name = "trix")]
#[command(about = "Persisted trigram index for fast code search")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build (or fully rebuild) the index for a directory
    Index {
        /// Directory to index
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Query a previously built index
    Search {
        /// Search query
        query: String,

        /// Directory whose index to query
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Verify results and print matching lines
        #[arg(short, long)]
        matches: bool,
    },
    /// Show statistics for a built index
    Stats {
        /// Directory whose index to inspect
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Serve index and search requests over stdin/stdout
    #[cfg(feature = "server")]
    Server,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = IndexConfig::default();
    let color = !cli.no_color;

    match cli.command {
        Commands::Index { path } => {
            run_index(&path, &config)?;
        }
        Commands::Search {
            query,
            path,
            matches,
        } => {
            let index = SearchIndex::load(&path, &config)?;

            let started = Instant::now();
            let results = index.query(&query)?;
            let elapsed = started.elapsed();

            output::print_result_set(&results, elapsed, color)?;
            if matches {
                for result in &results.results {
                    output::print_file_matches(result, color)?;
                }
            }
        }
        Commands::Stats { path } => {
            let index = SearchIndex::load(&path, &config)?;
            println!("Index Statistics");
            println!("================");
            println!();
            println!("Directory:      {}", path.display());
            println!("Distinct words: {}", index.word_count());
            println!("Indexed files:  {}", index.file_count());
        }
        #[cfg(feature = "server")]
        Commands::Server => {
            trix::server::serve(config)?;
        }
    }

    Ok(())
}

#[cfg(feature = "progress")]
fn run_index(path: &PathBuf, config: &IndexConfig) -> Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};

    println!("Indexing: {}", path.display());
    let started = Instant::now();

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("█▓▒░  "),
    );

    let report_bar = bar.clone();
    let report = move |claimed: usize, total: usize| {
        report_bar.set_length(total as u64);
        report_bar.set_position(claimed as u64);
    };
    build_index(path, config, Some(&report))?;

    bar.finish_and_clear();
    println!(
        "Indexed {} in {:.1}s",
        path.display(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

#[cfg(not(feature = "progress"))]
fn run_index(path: &PathBuf, config: &IndexConfig) -> Result<()> {
    println!("Indexing: {}", path.display());
    let started = Instant::now();
    build_index(path, config, None)?;
    println!(
        "Indexed {} in {:.1}s",
        path.display(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}
