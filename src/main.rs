use std::path::PathBuf;
use std::time::Instant;

use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use inat2logseq::fetch::{FetchOptions, Mode};
use inat2logseq::inat::InatClient;
use inat2logseq::run::{self, RunOptions};
use inat2logseq::settings::Settings;
use inat2logseq::taxa::{SpeciesRef, TaxonPageWriter};

const DEFAULT_SEARCH_URL: &str =
    "https://www.inaturalist.org/observations?place_id=any&subview=table&user_id=rhem42";

#[derive(Parser)]
#[command(
    name = "inat2logseq",
    about = "Turn iNaturalist observations into Logseq flashcards"
)]
struct Cli {
    /// Media to collect: photos or sounds
    #[arg(long = "type", value_enum)]
    mode: Mode,

    /// Saved iNaturalist observation search
    #[arg(short, long, default_value = DEFAULT_SEARCH_URL)]
    url: String,

    /// Max new flashcards in this run
    #[arg(long, default_value = "30")]
    max: usize,

    /// Only observations from this many days before the end date
    #[arg(long = "days_back")]
    days_back: Option<u32>,

    /// Only observations before this date (YYYY-MM-DD)
    #[arg(long = "observed_before_this_date")]
    observed_before_this_date: Option<String>,

    /// Also accept observations that are not research grade
    #[arg(long = "dont_require_research_grade", action = ArgAction::SetFalse)]
    require_research_grade: bool,

    /// Also get observations of captive organisms
    #[arg(long = "in_captivity")]
    in_captivity: bool,

    /// Extra tags for the flashcard section
    #[arg(short = 't', long = "extra_tags", num_args = 0..)]
    extra_tags: Vec<String>,

    /// Settings file (default: ./inat2logseq.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only create the pages of one species (taxon id or taxon page url), then exit
    #[arg(long)]
    species: Option<String>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .try_init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let t0 = Instant::now();
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref())?;
    info!(settings = ?settings, "Loaded settings");

    let paths = settings.paths(cli.mode);
    let api = InatClient::new(&settings.api_base_url)?;

    if let Some(species) = &cli.species {
        let species = match species.parse::<i64>() {
            Ok(id) => SpeciesRef::Id(id),
            Err(_) => SpeciesRef::Url(species.clone()),
        };
        paths.create_dirs(cli.mode)?;
        let page = TaxonPageWriter::new(&paths.taxa_dir, &settings.locales).write_species(&api, species)?;
        println!("{} -> [[{}]]", page.name, page.path);
        return Ok(());
    }
    let opts = RunOptions {
        fetch: FetchOptions {
            url: cli.url,
            mode: cli.mode,
            require_research_grade: cli.require_research_grade,
            captive: cli.in_captivity,
            observed_before: cli.observed_before_this_date,
            days_back: cli.days_back,
        },
        max_additions: cli.max,
        extra_tags: cli.extra_tags,
    };

    let pb = ProgressBar::new(opts.max_additions as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let today = chrono::Local::now().date_naive();
    let summary = run::run(&api, &paths, &settings.locales, &opts, today, &pb)?;
    pb.finish_and_clear();

    println!(
        "Added {} {} flashcards ({} already in graph, {} hybrids, {} not species) in {:.1}s",
        summary.added,
        cli.mode.as_str(),
        summary.already_in_graph,
        summary.hybrids,
        summary.not_species,
        t0.elapsed().as_secs_f64()
    );
    if let Some(journal) = &summary.journal {
        println!("Journal: {}", journal.display());
    }
    Ok(())
}
