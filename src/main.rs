use anyhow::{bail, Context, Result};
use demandmap::{
    aggregate,
    config::{AppConfig, GeocoderProvider},
    fetch,
    geocode::{
        cache::GeocodeCache, mock::MockGeocoder, nominatim::NominatimGeocoder,
        yandex::YandexGeocoder, AnyGeocoder, Coordinates,
    },
    parse,
    pipeline::{LocationResolutionPipeline, ProgressEvent},
    render::{self, geojson::GeoJsonRenderer, MapRenderer},
};
use reqwest::Client;
use std::{env, path::PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,demandmap=info"));
    fmt::Subscriber::builder().with_env_filter(env_filter).init();
    info!("startup");

    // ─── 2) load config, build HTTP client ───────────────────────────
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.yaml"));
    let cfg = AppConfig::load(&config_path)?;

    let client = Client::builder()
        .user_agent(concat!("demandmap/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building HTTP client")?;

    // ─── 3) fetch the demand table ───────────────────────────────────
    info!(spreadsheet = %cfg.spreadsheet_id, sheet = %cfg.sheet_name, "fetching demand table");
    let rows = fetch::sheet::fetch_rows(&client, &cfg).await?;
    info!(rows = rows.len(), "table fetched");

    // ─── 4) parse + aggregate ────────────────────────────────────────
    let (columns, parsed) = parse::parse_table(&rows).context("table schema mismatch")?;
    debug!(?columns, "resolved table columns");
    let locations = aggregate::aggregate(&parsed);
    info!(
        rows = parsed.len(),
        locations = locations.len(),
        "aggregated demand by address"
    );

    // ─── 5) resolve addresses, one lookup at a time ──────────────────
    let default_center = Coordinates {
        lat: cfg.default_center[0],
        lon: cfg.default_center[1],
    };
    let geocoder = match cfg.geocoder.provider {
        GeocoderProvider::Yandex => {
            if cfg.geocoder.apikey.is_empty() {
                bail!("the yandex geocoder requires geocoder.apikey in the config");
            }
            AnyGeocoder::Yandex(YandexGeocoder::new(client.clone(), cfg.geocoder.apikey.clone()))
        }
        GeocoderProvider::Nominatim => AnyGeocoder::Nominatim(NominatimGeocoder::new(client.clone())),
        GeocoderProvider::Mock => AnyGeocoder::Mock(MockGeocoder::fixed(default_center)),
    };

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
    let progress = tokio::spawn(async move {
        while let Some(ProgressEvent::Geocoding { current, total }) = progress_rx.recv().await {
            info!("geocoding {current} of {total}");
        }
    });

    let total = locations.len();
    let mut cache = GeocodeCache::new();
    let pipeline = LocationResolutionPipeline::new(geocoder).with_progress(progress_tx);
    let resolved = pipeline
        .resolve_all(&mut cache, locations)
        .await
        .context("nothing to display")?;
    drop(pipeline);
    let _ = progress.await;

    info!(
        resolved = resolved.len(),
        total,
        cached_queries = cache.len(),
        "resolution finished"
    );

    // ─── 6) render markers ───────────────────────────────────────────
    let markers = render::markers_for(&resolved);
    let mut renderer = GeoJsonRenderer::new(cfg.output.clone(), default_center);
    renderer.render(&markers)?;
    info!(output = %cfg.output.display(), markers = markers.len(), "wrote map markers");

    Ok(())
}
