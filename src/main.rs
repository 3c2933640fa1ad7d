mod config;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use url::Url;
use uuid::Uuid;

use feedcache::cache::{NullStore, SqliteStore};
use feedcache::feed::ReqwestClient;
use feedcache::{FeedImage, FeedService, PageMerger, Paginated};

#[derive(Parser, Debug)]
#[command(name = "feedcache")]
#[command(about = "Offline-first image feed loader with a local cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/feedcache/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Load the feed, falling back to the cache when offline
  Feed {
    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pages: usize,
  },
  /// Load one image, from the cache if present
  Image {
    url: Url,

    /// Write the image bytes here instead of printing their size
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
  /// Load the comments of one image
  Comments {
    /// Image id as listed by `feed`
    id: Uuid,
  },
  /// Remove the cached feed if it is expired or unreadable
  Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;
  let _guard = init_logging(config.log.file.as_deref())?;

  let service = build_service(&config)?;

  match args.command {
    Command::Feed { pages } => print_feed(&service, pages).await?,
    Command::Image { url, output } => {
      let data = service.load_image_data(url.clone()).result().await?;
      match output {
        Some(path) => {
          std::fs::write(&path, &data)?;
          println!("{} bytes written to {}", data.len(), path.display());
        }
        None => println!("{}: {} bytes", url, data.len()),
      }
    }
    Command::Comments { id } => {
      let comments = service.load_comments(id).result().await?;
      for comment in &comments {
        println!(
          "{}  {}  {}",
          comment.created_at.format("%Y-%m-%d %H:%M"),
          comment.username,
          comment.message
        );
      }
      println!("({} comments)", comments.len());
    }
    Command::Validate => {
      service.validate_cache().await;
      println!("Cache validated");
    }
  }

  Ok(())
}

fn init_logging(file: Option<&Path>) -> Result<Option<WorkerGuard>> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("feedcache=info"));

  match file {
    Some(path) => {
      let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
      let name = path
        .file_name()
        .ok_or_else(|| eyre!("Invalid log file path: {}", path.display()))?;
      std::fs::create_dir_all(dir)?;

      let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
      Ok(Some(guard))
    }
    None => {
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
      Ok(None)
    }
  }
}

fn build_service(config: &config::Config) -> Result<FeedService> {
  let client = Arc::new(ReqwestClient::new()?);
  let url = config.feed.url.clone();
  let page_size = config.feed.page_size;

  if !config.cache.enabled {
    info!("Cache disabled");
    return Ok(FeedService::with_store(client, url, page_size, Arc::new(NullStore)));
  }

  let path = match &config.cache.path {
    Some(path) => path.clone(),
    None => SqliteStore::default_path()?,
  };
  let store = SqliteStore::open(&path)?;

  Ok(FeedService::with_store(client, url, page_size, Arc::new(store)))
}

async fn print_feed(service: &FeedService, pages: usize) -> Result<()> {
  let mut merger: PageMerger<Url, usize> = PageMerger::new();
  let mut page: Paginated<FeedImage> = service.load_feed().result().await?;
  print_new_items(&mut merger, &page.items);

  // Every page repeats the items before it; print each image once
  for _ in 1..pages {
    match FeedService::load_more(&page) {
      Some(next) => {
        page = next.result().await?;
        print_new_items(&mut merger, &page.items);
      }
      None => break,
    }
  }

  if page.is_last_page() {
    println!("({} images, end of feed)", merger.len());
  } else {
    println!("({} images, more available)", merger.len());
  }

  Ok(())
}

fn print_new_items(merger: &mut PageMerger<Url, usize>, items: &[FeedImage]) {
  for image in new_items(merger, items) {
    let description = image.description.as_deref().unwrap_or("-");
    let location = image.location.as_deref().unwrap_or("-");
    println!("{}  {}  {}  {}", image.id, image.url, location, description);
  }
}

/// Items whose URL the merger has not seen before, in page order.
fn new_items<'a>(merger: &mut PageMerger<Url, usize>, items: &'a [FeedImage]) -> Vec<&'a FeedImage> {
  let seen = merger.len();
  let mut next = seen;
  let order = merger.merge(
    items,
    |image| image.url.clone(),
    |_| {
      next += 1;
      next - 1
    },
  );

  // New positions are handed out in order of first appearance
  let mut fresh = seen;
  items
    .iter()
    .zip(order)
    .filter_map(|(image, position)| {
      if position != fresh {
        return None;
      }
      fresh += 1;
      Some(image)
    })
    .collect()
}
