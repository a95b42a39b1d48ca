use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use skein::model::{sort_articles, ArticleCollection, Feed, Library};
use skein::{fetch, store, Config};

/// Returns the skein config directory (~/.config/skein), creating nothing.
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("skein"))
}

#[derive(Parser, Debug)]
#[command(name = "skein", about = "Personal RSS/Atom feed reader")]
struct Args {
    /// Override the library file path (default: ~/.config/skein/library.json)
    #[arg(long, value_name = "FILE")]
    library: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Subscribe to a feed
    Add {
        /// Feed URL (feed:// and feed: prefixes are accepted)
        url: String,
        /// Group to add the feed to (created if missing)
        #[arg(long)]
        group: Option<String>,
    },
    /// Unsubscribe from a feed
    Remove { url: String },
    /// List subscribed feeds with article counts
    List,
    /// Show articles, newest first by default
    Show {
        /// Only unread articles
        #[arg(long)]
        unread: bool,
        /// Only saved articles
        #[arg(long)]
        saved: bool,
    },
    /// Fetch all feeds and ingest new articles
    Refresh,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    let config = Config::load(&config_dir.join("config.toml"))?;
    let library_path = args
        .library
        .unwrap_or_else(|| config_dir.join("library.json"));

    let mut library = store::load(&library_path, config.days_to_keep_articles)
        .with_context(|| format!("Failed to load library from {}", library_path.display()))?;

    match args.command {
        Command::Add { url, group } => {
            if library.find_feed(&url).is_some() {
                anyhow::bail!("Already subscribed to {url}");
            }
            let feed = Feed::new(&url)?;
            println!("Subscribed to {}", feed.url);
            match group {
                Some(name) => match library.group_mut(&name) {
                    Some(group) => group.add_feed(feed),
                    None => {
                        let mut group = skein::model::FeedGroup::new(&name);
                        group.add_feed(feed);
                        library.groups.push(group);
                    }
                },
                None => library.default_group_mut().add_feed(feed),
            }
            store::save(&library, &library_path)?;
        }
        Command::Remove { url } => {
            match library.remove_feed(&url) {
                Some(feed) => println!("Unsubscribed from {}", feed.url),
                None => anyhow::bail!("Not subscribed to {url}"),
            }
            store::save(&library, &library_path)?;
        }
        Command::List => {
            for group in &library.groups {
                println!("{}", group.title());
                for feed in &group.feeds {
                    println!(
                        "  {} ({} articles, {} unread)  {}",
                        feed.title(),
                        feed.articles.len(),
                        feed.articles.iter().filter(|a| !a.read).count(),
                        feed.url
                    );
                }
            }
        }
        Command::Show { unread, saved } => {
            let mut articles = if unread {
                library.unread()
            } else if saved {
                library.saved()
            } else {
                library.all_articles()
            };
            sort_articles(&mut articles, config.sort);
            for article in articles {
                let marker = if article.read { ' ' } else { '*' };
                println!(
                    "{} {}  {}  {}",
                    marker,
                    article.publish_date.format("%Y-%m-%d"),
                    article.title,
                    article.url
                );
            }
        }
        Command::Refresh => {
            let client = reqwest::Client::builder()
                .user_agent(concat!("skein/", env!("CARGO_PKG_VERSION")))
                .build()?;
            let options = config.fetch_options();

            // split borrows: feeds get mutated while tombstones are read
            let Library {
                groups,
                deleted_ids,
            } = &mut library;

            let mut total_new = 0usize;
            let mut failures = 0usize;
            for group in groups.iter_mut() {
                if !group.automatic_refresh {
                    tracing::info!(group = %group.title(), "Skipping group (automatic refresh off)");
                    continue;
                }
                let outcomes = fetch::refresh_all(
                    &client,
                    &mut group.feeds,
                    deleted_ids,
                    &options,
                    |feed, result| match result {
                        Ok(added) => println!("{}: {} new", feed.title(), added),
                        Err(e) => println!("{}: {}", feed.title(), e),
                    },
                )
                .await;
                for outcome in &outcomes {
                    match &outcome.result {
                        Ok(added) => total_new += added,
                        Err(_) => failures += 1,
                    }
                }
            }

            println!("{total_new} new articles{}", plural_failures(failures));
            store::save(&library, &library_path)?;
        }
    }

    Ok(())
}

fn plural_failures(failures: usize) -> String {
    match failures {
        0 => String::new(),
        1 => ", 1 feed failed".to_string(),
        n => format!(", {n} feeds failed"),
    }
}
