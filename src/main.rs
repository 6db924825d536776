use std::io::{self, BufRead};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use character_catalog::assets::{AssetLookup, AssetResolver, LogoSubject, gallery_paths, hero_image};
use character_catalog::character::ResolvedCharacter;
use character_catalog::config::CatalogConfig;
use character_catalog::featured::select_featured;
use character_catalog::loader::{load_catalog, load_videos};
use character_catalog::normalize::Catalog;
use character_catalog::query::{Facet, SortKey, series_options, universe_options};
use character_catalog::session::{Intent, SessionState, browse};
use character_catalog::types::Video;
use character_catalog::videos::{Provenance, VideoPanel, thumbnail_url, watch_url};

#[derive(Parser)]
#[command(name = "catalog", about = "Browse the character catalog")]
struct Cli {
    /// Directory holding data.json and videos.json
    #[arg(long, env = "CATALOG_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,
    /// Asset root; when set, image paths are checked against the files under it
    #[arg(long, env = "CATALOG_ASSETS_DIR", global = true)]
    assets_dir: Option<PathBuf>,
    /// TOML configuration file
    #[arg(long, env = "CATALOG_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct Filters {
    /// Universe to keep, or "all"
    #[arg(long, default_value = "all")]
    universe: Facet,
    /// Series name to keep, or "all"
    #[arg(long, default_value = "all")]
    series: Facet,
    /// name | rating | universe
    #[arg(long)]
    sort: Option<SortKey>,
}

impl Filters {
    fn intents(&self, search: Option<&str>) -> Vec<Intent> {
        let mut out = vec![
            Intent::SetUniverse(self.universe.clone()),
            Intent::SetSeries(self.series.clone()),
            Intent::SetSort(self.sort),
        ];
        if let Some(term) = search {
            out.push(Intent::SetSearch(term.to_string()));
        }
        out
    }
}

#[derive(Subcommand)]
enum Command {
    /// Filter and sort characters
    Search {
        /// Text matched against names, aliases, titles and abilities
        term: Option<String>,
        #[command(flatten)]
        filters: Filters,
    },
    /// Detail view of one character in the filtered list
    Show {
        /// Character id to open (deep link)
        #[arg(long, conflicts_with = "index")]
        character: Option<String>,
        /// Position in the filtered list
        #[arg(long)]
        index: Option<usize>,
        #[arg(long)]
        search: Option<String>,
        #[command(flatten)]
        filters: Filters,
        /// Steps to move after opening; negative goes back
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        step: i64,
    },
    /// Highlighted characters
    Featured,
    /// Related videos for a character
    Videos {
        id: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Universe and series filter choices
    Facets,
    /// Catalog statistics
    Stats,
    /// Read commands from stdin (search, universe, series, sort, open, link,
    /// next, prev, close) and print the session after each
    Browse,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "character_catalog=info,catalog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let ctx = App::open(config)?;

    match cli.command {
        Command::Search { term, filters } => run_search(&ctx, term.as_deref(), &filters),
        Command::Show {
            character,
            index,
            search,
            filters,
            step,
        } => run_show(&ctx, character, index, search.as_deref(), &filters, step),
        Command::Featured => run_featured(&ctx),
        Command::Videos { id, limit } => run_videos(&ctx, &id, limit),
        Command::Facets => run_facets(&ctx),
        Command::Stats => run_stats(&ctx),
        Command::Browse => run_browse(&ctx),
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  SETUP: layered configuration, catalog load
// ═══════════════════════════════════════════════════════════════════════

/// Flags and environment beat the config file, which beats defaults.
fn resolve_config(cli: &Cli) -> Result<CatalogConfig> {
    let mut config = match &cli.config {
        Some(path) => CatalogConfig::load(path)
            .with_context(|| format!("cannot load configuration {}", path.display()))?,
        None => CatalogConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(dir) = &cli.assets_dir {
        config.assets_dir = Some(dir.clone());
    }
    Ok(config)
}

struct App {
    config: CatalogConfig,
    assets: AssetResolver,
    catalog: Catalog,
}

impl App {
    fn open(config: CatalogConfig) -> Result<Self> {
        let assets = match &config.assets_dir {
            Some(root) => AssetResolver::scan(root),
            None => AssetResolver::new(),
        };
        let catalog = load_catalog(&config.data_dir, &assets)
            .with_context(|| format!("cannot load {}", config.data_file().display()))?;
        Ok(App {
            config,
            assets,
            catalog,
        })
    }

    /// `None` when the video document cannot be loaded; browsing goes on.
    fn videos(&self) -> Option<Vec<Video>> {
        match load_videos(&self.config.data_dir) {
            Ok(videos) => Some(videos),
            Err(e) => {
                warn!(error = %e, "videos unavailable");
                None
            }
        }
    }
}

fn print_json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("JSON serialization")?;
    println!("{json}");
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
//  OUTPUT SHAPES
// ═══════════════════════════════════════════════════════════════════════

/// One grid card.
#[derive(Serialize)]
struct Card<'a> {
    id: &'a str,
    name: &'a str,
    universe: &'a str,
    subtitle: &'a str,
    series: &'a str,
    rating: &'a str,
    stars: String,
    logo: String,
}

fn card<'a>(assets: &impl AssetLookup, c: &'a ResolvedCharacter) -> Card<'a> {
    Card {
        id: &c.id,
        name: &c.name,
        universe: &c.universe,
        subtitle: c.subtitle(),
        series: c.primary_series(),
        rating: &c.rating,
        stars: c.stars().render(),
        logo: assets.logo(&LogoSubject::of(c)),
    }
}

#[derive(Serialize)]
struct VideoLink<'a> {
    title: &'a str,
    duration: &'a str,
    views: &'a str,
    watch_url: String,
    thumbnail_url: String,
}

#[derive(Serialize)]
struct VideoSection<'a> {
    provenance: Option<Provenance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    videos: Vec<VideoLink<'a>>,
}

impl<'a> From<VideoPanel<'a>> for VideoSection<'a> {
    fn from(panel: VideoPanel<'a>) -> Self {
        let message = panel.message();
        match panel {
            VideoPanel::Videos(rec) => VideoSection {
                provenance: Some(rec.provenance),
                message,
                videos: rec
                    .videos
                    .into_iter()
                    .map(|v| VideoLink {
                        title: &v.title,
                        duration: &v.duration,
                        views: &v.views,
                        watch_url: watch_url(v),
                        thumbnail_url: thumbnail_url(v),
                    })
                    .collect(),
            },
            VideoPanel::Empty => VideoSection {
                provenance: Some(Provenance::None),
                message,
                videos: Vec::new(),
            },
            VideoPanel::Unavailable => VideoSection {
                provenance: None,
                message,
                videos: Vec::new(),
            },
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  SEARCH / SHOW
// ═══════════════════════════════════════════════════════════════════════

fn session_for(ctx: &App, filters: &Filters, search: Option<&str>) -> SessionState {
    let index = &ctx.catalog.index;
    filters
        .intents(search)
        .into_iter()
        .fold(SessionState::initial(index), |s, intent| {
            s.dispatch(index, intent)
        })
}

fn run_search(ctx: &App, term: Option<&str>, filters: &Filters) -> Result<()> {
    let state = session_for(ctx, filters, term);
    let q = state.query();

    #[derive(Serialize)]
    struct SearchResult<'a> {
        search: &'a str,
        universe: String,
        series: String,
        sort: Option<String>,
        label: String,
        characters: Vec<Card<'a>>,
    }

    let result = SearchResult {
        search: &q.search_term,
        universe: q.universe.to_string(),
        series: q.series.to_string(),
        sort: q.sort_by.map(|k| k.to_string()),
        label: state.results_label(),
        characters: state
            .result_characters(&ctx.catalog.index)
            .into_iter()
            .map(|c| card(&ctx.assets, c))
            .collect(),
    };
    info!("{}", result.label);
    print_json(&result)
}

fn run_show(
    ctx: &App,
    character: Option<String>,
    position: Option<usize>,
    search: Option<&str>,
    filters: &Filters,
    step: i64,
) -> Result<()> {
    let index = &ctx.catalog.index;
    let open = match &character {
        Some(id) => Intent::OpenDeepLink(id.clone()),
        None => Intent::OpenDetail(position.unwrap_or(0)),
    };
    let mut state = session_for(ctx, filters, search).dispatch(index, open);
    if !state.detail().is_open() {
        match character {
            Some(id) => bail!("character `{id}` is not in the current results"),
            None => bail!(
                "position {} is outside the current results ({})",
                position.unwrap_or(0),
                state.results_label()
            ),
        }
    }

    if step != 0 {
        state = state.dispatch(index, Intent::Step(step));
    }

    let Some(c) = state.current(index) else {
        bail!("detail view closed unexpectedly");
    };
    let videos = ctx.videos();
    let panel = VideoPanel::build(&c.id, index, videos.as_deref(), ctx.config.videos.limit);

    #[derive(Serialize)]
    struct Detail<'a> {
        position: usize,
        total: usize,
        can_go_previous: bool,
        can_go_next: bool,
        stars: String,
        hero_image: String,
        gallery: Vec<String>,
        logo: String,
        character: &'a ResolvedCharacter,
        videos: VideoSection<'a>,
    }

    let detail = state.detail();
    print_json(&Detail {
        position: detail.position().unwrap_or(0),
        total: detail.len(),
        can_go_previous: detail.can_go_previous(),
        can_go_next: detail.can_go_next(),
        stars: c.stars().render(),
        hero_image: hero_image(&ctx.assets, c),
        gallery: gallery_paths(&ctx.assets, c),
        logo: ctx.assets.logo(&LogoSubject::of(c)),
        character: c,
        videos: panel.into(),
    })
}

// ═══════════════════════════════════════════════════════════════════════
//  FEATURED / VIDEOS / FACETS
// ═══════════════════════════════════════════════════════════════════════

fn run_featured(ctx: &App) -> Result<()> {
    let picks = select_featured(&ctx.catalog.index, &ctx.config.featured);
    info!(
        picked = picks.len(),
        target = ctx.config.featured.target_count,
        "featured selection"
    );
    let cards: Vec<Card> = picks.into_iter().map(|c| card(&ctx.assets, c)).collect();
    print_json(&cards)
}

fn run_videos(ctx: &App, id: &str, limit: Option<usize>) -> Result<()> {
    let limit = limit.unwrap_or(ctx.config.videos.limit);
    if limit == 0 {
        bail!("--limit must be at least 1");
    }
    if ctx.catalog.index.get(id).is_none() {
        warn!(%id, "unknown character id");
    }
    let videos = ctx.videos();
    let panel = VideoPanel::build(id, &ctx.catalog.index, videos.as_deref(), limit);
    let section: VideoSection = panel.into();
    print_json(&section)
}

fn run_facets(ctx: &App) -> Result<()> {
    #[derive(Serialize)]
    struct Facets {
        universes: Vec<String>,
        series: Vec<String>,
    }
    print_json(&Facets {
        universes: universe_options(&ctx.catalog.index),
        series: series_options(&ctx.catalog.series),
    })
}

// ═══════════════════════════════════════════════════════════════════════
//  STATS
// ═══════════════════════════════════════════════════════════════════════

fn run_stats(ctx: &App) -> Result<()> {
    let index = &ctx.catalog.index;

    let mut by_universe: IndexMap<&str, usize> = IndexMap::new();
    let mut by_series: IndexMap<&str, usize> = IndexMap::new();
    for c in index {
        *by_universe.entry(c.universe.as_str()).or_default() += 1;
        for name in &c.series_names {
            *by_series.entry(name.as_str()).or_default() += 1;
        }
    }
    let videos = ctx.videos();

    #[derive(Serialize)]
    struct Stats<'a> {
        characters: usize,
        series: usize,
        dropped_references: usize,
        videos: Option<usize>,
        asset_files: Option<usize>,
        by_universe: IndexMap<&'a str, usize>,
        by_series: IndexMap<&'a str, usize>,
    }

    let stats = Stats {
        characters: index.len(),
        series: ctx.catalog.series.len(),
        dropped_references: ctx.catalog.dropped_references,
        videos: videos.as_ref().map(Vec::len),
        asset_files: ctx.assets.inventory_len(),
        by_universe,
        by_series,
    };

    info!(
        characters = stats.characters,
        series = stats.series,
        dropped_references = stats.dropped_references,
        "catalog statistics"
    );
    for (universe, count) in &stats.by_universe {
        info!("  {universe}: {count} characters");
    }
    print_json(&stats)
}

// ═══════════════════════════════════════════════════════════════════════
//  BROWSE: intent lines from stdin
// ═══════════════════════════════════════════════════════════════════════

#[derive(Serialize)]
struct Snapshot<'a> {
    label: String,
    results: &'a [String],
    detail: Option<&'a str>,
    can_go_previous: bool,
    can_go_next: bool,
}

fn emit(state: &SessionState) -> Result<()> {
    let detail = state.detail();
    let snapshot = Snapshot {
        label: state.results_label(),
        results: state.results(),
        detail: detail.current(),
        can_go_previous: detail.can_go_previous(),
        can_go_next: detail.can_go_next(),
    };
    println!("{}", serde_json::to_string(&snapshot).context("JSON serialization")?);
    Ok(())
}

fn run_browse(ctx: &App) -> Result<()> {
    let lines = io::stdin()
        .lock()
        .lines()
        .map(|line| line.context("cannot read stdin"));
    let state = browse(&ctx.catalog.index, ctx.config.debounce(), lines, Instant::now, emit)?;
    info!(results = state.results().len(), "browse session ended");
    Ok(())
}
