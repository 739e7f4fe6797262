mod config;
mod output;
mod parser;
mod pipeline;
mod record;
mod wiki;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use config::{NumericPolicy, Settings};

#[derive(Parser)]
#[command(name = "equipment_scraper", about = "Equipment stats extractor for the RuneScape wiki")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the wiki, extract every equipment page and write the JSON file
    Run {
        /// api.php endpoint
        #[arg(long, env = "WIKI_API_URL", default_value = config::DEFAULT_API_URL)]
        api_url: String,
        /// Output JSON path
        #[arg(short, long, env = "EQUIPMENT_OUTPUT", default_value = config::DEFAULT_OUTPUT)]
        output: PathBuf,
        /// Search expression selecting candidate pages
        #[arg(long, default_value = config::SEARCH_QUERY)]
        search: String,
        /// Max pages to read (default: all search hits)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Keep non-numeric text in numeric fields instead of failing
        #[arg(long)]
        lenient_numbers: bool,
    },
    /// Extract records from a local wikitext file and print them as JSON
    Extract {
        /// File holding the page's raw markup
        path: PathBuf,
        /// Page title (default: file stem)
        #[arg(short, long)]
        title: Option<String>,
        /// Keep non-numeric text in numeric fields instead of failing
        #[arg(long)]
        lenient_numbers: bool,
    },
    /// Print recognized fields, filters and translation tables
    Fields,
}

fn policy(lenient: bool) -> NumericPolicy {
    if lenient {
        NumericPolicy::Lenient
    } else {
        NumericPolicy::Strict
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            api_url,
            output,
            search,
            limit,
            lenient_numbers,
        } => {
            let settings = Settings {
                api_url,
                output,
                search,
                max_pages: limit,
                numeric: policy(lenient_numbers),
            };
            let client = wiki::WikiClient::new(&settings.api_url)?;
            println!("Searching {} ...", settings.api_url);
            let (records, stats) = pipeline::run(&client, &settings).await?;
            output::write_json(&settings.output, &records)?;
            println!(
                "Done: {} pages read ({} excluded), {} equipment pages, {} records -> {}",
                stats.pages,
                stats.excluded,
                stats.equipment_pages,
                stats.records,
                settings.output.display()
            );
            Ok(())
        }
        Commands::Extract {
            path,
            title,
            lenient_numbers,
        } => {
            let markup = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let title = title.unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().replace('_', " "))
                    .unwrap_or_default()
            });
            let records = parser::extract_page(&markup, &title, policy(lenient_numbers))?;
            println!("{}", output::to_json(&records)?);
            Ok(())
        }
        Commands::Fields => {
            print!("{}", config::describe());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
