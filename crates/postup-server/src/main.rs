//! postup server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the JSON API over HTTP.
//!
//! # VAPID key generation
//!
//! To generate the key pair for the `[push]` section of config.toml:
//!
//! ```
//! cargo run -p postup-server --bin postup-server -- --generate-vapid-keys
//! ```

use std::{
  net::SocketAddr,
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use postup_geo::{IpLocator, MapboxGeocoder};
use postup_push::{Broadcaster, VapidConfig, WebPushTransport};
use postup_server::{AppState, ServerConfig, config::PushConfig, keys::generate_vapid_keys};
use postup_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "postup server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print a fresh VAPID key pair and exit.
  #[arg(long)]
  generate_vapid_keys: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Helper mode: generate push keys and exit.
  if cli.generate_vapid_keys {
    let pair = generate_vapid_keys().map_err(|e| anyhow::anyhow!("pkcs8 error: {e}"))?;
    println!("# Save the private key as vapid.pem:");
    print!("{}", pair.private_key_pem);
    println!();
    println!("# Then add to config.toml:");
    println!("[push]");
    println!("public_key       = \"{}\"", pair.public_key);
    println!("private_key_path = \"vapid.pem\"");
    println!("contact          = \"mailto:admin@example.com\"");
    return Ok(());
  }

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("POSTUP")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  // Open SQLite store.
  let store = Arc::new(
    SqliteStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open store at {store_path:?}"))?,
  );

  let geocoder = MapboxGeocoder::new(
    server_cfg.geocoding.base_url.clone(),
    server_cfg.geocoding.mapbox_token.clone(),
  )
  .context("failed to build geocoding client")?;
  if !geocoder.is_configured() {
    tracing::info!("no mapbox token; posts will be stored without place names");
  }

  let locator = IpLocator::new(server_cfg.location.lookup_url.clone())
    .context("failed to build ip lookup client")?;

  // Start the push worker if keys are configured.
  let broadcaster = match load_vapid(&server_cfg.push)? {
    Some(vapid) => {
      if let Err(e) = vapid.validate_public_key() {
        tracing::warn!(error = %e, "configured VAPID public key looks invalid");
      }
      let transport = WebPushTransport::new(vapid).context("failed to build push client")?;
      let (broadcaster, _worker) = Broadcaster::spawn(Arc::clone(&store), Arc::new(transport));
      tracing::info!("push notifications enabled");
      broadcaster
    }
    None => {
      tracing::info!("push keys not configured; notifications disabled");
      Broadcaster::disabled()
    }
  };

  // Build application state.
  let state = AppState {
    store,
    geocoder: Arc::new(geocoder),
    locator: Arc::new(locator),
    broadcaster,
    config: Arc::new(server_cfg.clone()),
  };

  let app = postup_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .await
    .context("server error")?;

  Ok(())
}

/// Read the VAPID private key named in `[push]`. `None` when either half of
/// the key pair is not configured.
fn load_vapid(push: &PushConfig) -> anyhow::Result<Option<VapidConfig>> {
  let (Some(public_key), Some(path)) = (&push.public_key, &push.private_key_path) else {
    return Ok(None);
  };

  let path = expand_tilde(path);
  let private_key_pem = std::fs::read_to_string(&path)
    .with_context(|| format!("failed to read VAPID private key at {path:?}"))?;

  Ok(Some(VapidConfig {
    public_key: public_key.clone(),
    private_key_pem,
    contact: push.contact.clone(),
    ttl: push.ttl_seconds,
  }))
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
