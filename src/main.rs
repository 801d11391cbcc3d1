//! Postwall CLI
//!
//! Terminal front end for the post wall:
//! - Watch the live grid
//! - List posts once
//! - Generate a config file

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use postwall::config::{generate_default_config, Config};
use postwall::{
    logging, Comment, EventKind, FeedSession, Post, PostCard, PostList, PostSource, PostsClient,
    WsChannel,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "postwall")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Live grid of social posts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: platform config dir, then ./postwall.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL, overrides the config file
    #[arg(long, global = true)]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Mount the wall and re-render it on every change.
    ///
    /// Type `toggle <post-id>` to flip a post's AI-reply flag.
    Watch,

    /// Load posts once and print them
    Posts {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }

    logging::init(&config.logging);

    match cli.command {
        Commands::Watch => watch(&config).await,
        Commands::Posts { format } => list_posts(&config, format).await,
        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Config written to {}", path.display());
                }
                None => print!("{}", content),
            }
            Ok(())
        }
    }
}

async fn watch(config: &Config) -> anyhow::Result<()> {
    let source = Arc::new(PostsClient::new(&config.api)?);
    let live_url = config.live_url();

    // The wall still loads without the push channel; it just won't update
    let channel = match WsChannel::connect(&live_url, &EventKind::ALL).await {
        Ok(channel) => Some(channel),
        Err(e) => {
            tracing::error!(url = %live_url, error = %e, "Push channel unavailable");
            None
        }
    };

    let session = FeedSession::mount(source, channel);
    let mut updates = session.watch();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    render_grid(&session.posts());

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let posts = updates.borrow_and_update().clone();
                render_grid(&posts);
            }
            line = input.next_line() => match line? {
                Some(line) => match parse_toggle(&line) {
                    Some(post_id) => session.toggle_ai_reply(post_id),
                    None if line.trim().is_empty() => {}
                    None => eprintln!("Unknown command: {} (expected: toggle <post-id>)", line.trim()),
                },
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.unmount().await;
    Ok(())
}

async fn list_posts(config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let client = PostsClient::new(&config.api)?;
    let posts = client
        .fetch_posts()
        .await
        .with_context(|| format!("loading {}", client.posts_url()))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&posts)?),
        OutputFormat::Table => print_table(&posts),
    }
    Ok(())
}

fn parse_toggle(line: &str) -> Option<&str> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("toggle"), Some(post_id), None) => Some(post_id),
        _ => None,
    }
}

fn print_table(posts: &[Post]) {
    if posts.is_empty() {
        println!("No posts.");
        return;
    }

    println!(
        "{:<20} {:<15} {:>7} {:>9}  {}",
        "ID", "Date", "Likes", "Comments", "Caption"
    );
    println!("{}", "-".repeat(80));
    for post in posts {
        let card = PostCard::new(post);
        let caption = card.caption.lines().next().unwrap_or_default();
        println!(
            "{:<20} {:<15} {:>7} {:>9}  {}",
            card.id, card.date, card.likes, card.comments_count, caption
        );
    }
}

fn render_grid(posts: &PostList) {
    println!();
    println!("=== {} posts ===", posts.len());

    for post in posts {
        let card = PostCard::new(post);
        println!();
        println!("[{}] {} ({})", card.id, card.date, card.media_type);
        if !card.caption.is_empty() {
            for line in card.caption.lines() {
                println!("  {}", line);
            }
        }
        println!(
            "  {} likes · {} comments · {}",
            card.likes,
            card.comments_count,
            card.toggle_label()
        );
        for comment in card.recent_comments {
            println!("{}", comment_line(comment));
        }
        if !card.permalink.is_empty() {
            println!("  {}", card.permalink);
        }
    }
}

/// Viewer-authored comments are starred
fn comment_line(comment: &Comment) -> String {
    let marker = if comment.is_from_viewer() { '*' } else { ' ' };
    format!("   {}@{}: {}", marker, comment.username, comment.text)
}
