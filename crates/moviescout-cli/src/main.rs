use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use futures::StreamExt;
use moviescout_core::{
    Category, Config, FetchOutcome, Movie, MovieListStateMachine, MovieListStore,
    MovieListUiEvent, SqliteStore, TmdbProvider, ViewState,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "moviescout")]
#[command(version, about = "Cache-first movie lists from TMDB", long_about = None)]
struct Cli {
    /// TMDB API key (overrides the config file)
    #[arg(long, env = "TMDB_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    /// SQLite cache location (overrides the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Read this config file instead of the default one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Fetch a movie list, from the cache when possible
    List {
        /// popular, upcoming, top_rated or now_playing
        #[arg(short, long, default_value = "popular")]
        category: Category,
        /// Page to request when going to the API
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        /// Skip the cache and hit the API
        #[arg(long)]
        refresh: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show a cached movie
    Show {
        id: u64,
        #[arg(long)]
        json: bool,
    },
    /// Load both lists, page through popular, and print the resulting state
    Browse {
        /// Extra popular pages to load after the first
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Remove every cached movie
    ClearCache,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so --json output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moviescout=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let local = open_local(&config)?;

    match cli.command {
        Commands::List {
            category,
            page,
            refresh,
            json,
        } => {
            let store = build_store(&config, &local)?;
            run_list(&store, category, page, refresh, json).await?;

            if let Some(cached_at) = local.cache().last_cached_at(category.as_str())? {
                debug!("{} last cached at {}", category, cached_at);
            }
        }
        Commands::Show { id, json } => {
            let store = build_store(&config, &local)?;
            run_show(&store, id, json).await?;
        }
        Commands::Browse { pages } => {
            let store = build_store(&config, &local)?;
            run_browse(store, pages).await?;
        }
        Commands::ClearCache => {
            let removed = local.cache().clear()?;
            println!("Removed {} cached movies", removed);
        }
    }

    Ok(())
}

/// File first, then env/CLI on top
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(key) = &cli.api_key {
        config.api.api_key = Some(key.clone());
    }
    if let Some(db) = &cli.db {
        config.cache.db_path = Some(db.clone());
    }

    Ok(config)
}

fn open_local(config: &Config) -> anyhow::Result<SqliteStore> {
    let path = config.cache.resolved_db_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Cache path is not valid UTF-8: {}", path.display()))?;
    debug!("Using cache at {}", path_str);
    Ok(SqliteStore::open(path_str)?)
}

fn build_store(config: &Config, local: &SqliteStore) -> anyhow::Result<MovieListStore> {
    if config.api.api_key.is_none() {
        warn!("No TMDB API key configured; only cached movies will load");
    }

    let remote = TmdbProvider::from_config(&config.api)?;
    Ok(MovieListStore::new(Arc::new(remote), Arc::new(local.clone())))
}

async fn run_list(
    store: &MovieListStore,
    category: Category,
    page: u32,
    refresh: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut outcomes = store.fetch_list(refresh, category, page);

    while let Some(outcome) = outcomes.next().await {
        match outcome {
            FetchOutcome::Loading(true) => info!("Loading {} movies...", category),
            FetchOutcome::Loading(false) => debug!("Finished loading {}", category),
            FetchOutcome::Success(movies) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&movies)?);
                } else {
                    print_movies(&movies);
                }
            }
            FetchOutcome::Error(message) => anyhow::bail!("{}", message),
        }
    }

    Ok(())
}

async fn run_show(store: &MovieListStore, id: u64, json: bool) -> anyhow::Result<()> {
    let mut outcomes = store.fetch_by_id(id);

    while let Some(outcome) = outcomes.next().await {
        match outcome {
            FetchOutcome::Success(movie) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&movie)?);
                } else {
                    print_movie_details(&movie);
                }
            }
            FetchOutcome::Error(message) => anyhow::bail!("{} (id {})", message, id),
            FetchOutcome::Loading(_) => {}
        }
    }

    Ok(())
}

async fn run_browse(store: MovieListStore, pages: u32) -> anyhow::Result<()> {
    let machine = MovieListStateMachine::new(store);
    let mut rx = machine.subscribe();

    // The loading flag is shared, so "idle" can mean the other list is still
    // in flight; good enough for a terminal summary.
    wait_until_idle(&mut rx).await?;

    for _ in 0..pages {
        let before = machine.snapshot().popular_page;
        machine.handle_event(MovieListUiEvent::Paginate(Category::Popular));
        wait_until_idle(&mut rx).await?;

        if machine.snapshot().popular_page == before {
            warn!("Popular page {} did not load, stopping", before);
            break;
        }
    }

    machine.handle_event(MovieListUiEvent::Navigate);
    print_summary(&machine.snapshot());
    Ok(())
}

async fn wait_until_idle(rx: &mut watch::Receiver<ViewState>) -> anyhow::Result<()> {
    rx.wait_for(|state| !state.is_loading).await?;
    Ok(())
}

fn print_movies(movies: &[Movie]) {
    for movie in movies {
        let year = movie
            .release_date
            .map(|d| d.format("%Y").to_string())
            .unwrap_or_else(|| "----".to_string());
        println!(
            "{:>8}  {}  ({})  {:.1}/10",
            movie.id, movie.title, year, movie.vote_average
        );
    }
}

fn print_movie_details(movie: &Movie) {
    println!("{} [{}]", movie.title, movie.id);
    if movie.original_title != movie.title {
        println!("  Original title: {}", movie.original_title);
    }
    if let Some(date) = movie.release_date {
        println!("  Released:       {}", date);
    }
    println!("  Rating:         {:.1}/10 ({} votes)", movie.vote_average, movie.vote_count);
    println!("  Listed under:   {}", movie.category);
    if !movie.overview.is_empty() {
        println!();
        println!("{}", movie.overview);
    }
}

fn print_summary(state: &ViewState) {
    println!(
        "popular:  {} movies, next page {}",
        state.popular_movies.len(),
        state.popular_page
    );
    println!(
        "upcoming: {} movies, next page {}",
        state.upcoming_movies.len(),
        state.upcoming_page
    );

    let current = state.current_category();
    println!();
    println!("Now showing {}:", current);
    let movies = state.movies(current);
    print_movies(&movies[..movies.len().min(10)]);
}
