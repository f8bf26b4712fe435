use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use spdlog::{info, warn};

use chronicle::blog::Blog;
use chronicle::config::Config;
use chronicle::logger::configure_logger;
use chronicle::notify::notify_handler::{NotifyHandler, DEFAULT_QUEUE_SIZE};
use chronicle::notify::notify_sender::NotifySender;
use chronicle::notify::outbox_writer::OutboxWriter;
use chronicle::notify::Notifier;
use chronicle::text_utils::{format_time, pluralize};

use crate::config::open_config;
use crate::config_data::write_sample_cfg;

mod config;
mod config_data;

const CFG_FILE_NAME: &str = "chronicle.toml";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config path
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a sample configuration file
    Init,
    /// Load every post and report the files that were skipped
    Check,
    /// List posts, newest first
    List,
    /// Print a post and its comments
    Show {
        ident: String,
    },
    /// Add a comment to a post
    Comment {
        ident: String,
        #[arg(short, long)]
        author: String,
        #[arg(short, long, default_value = "")]
        email: String,
        #[arg(short, long)]
        body: String,
    },
}

fn start_notifier(config: &Config) -> Result<Option<NotifyHandler>> {
    let Some(ref notify) = config.notify else {
        return Ok(None);
    };
    let Some(ref outbox) = notify.outbox else {
        return Ok(None);
    };

    let writer = OutboxWriter::new(outbox, notify.recipients.clone())
        .map_err(|e| anyhow!("Could not open outbox {}: {}", outbox.display(), e))?;
    let queue_size = notify.queue_size.unwrap_or(DEFAULT_QUEUE_SIZE);
    Ok(Some(NotifyHandler::new(writer, queue_size)))
}

fn check(blog: &Blog) -> Result<()> {
    let summary = blog.refresh()?;
    println!("Loaded {}", pluralize(summary.loaded, "post"));
    for skipped in &summary.skipped {
        println!("Skipped {}: {}", skipped.file_name.display(), skipped.reason);
    }
    Ok(())
}

fn list(blog: &Blog) {
    for post in blog.list_posts().posts() {
        println!(
            "{}  {}  {} ({})",
            format_time(&post.created()),
            post.ident(),
            post.title(),
            pluralize(post.comment_count(), "comment")
        );
    }
}

fn show(blog: &Blog, ident: &str) -> Result<()> {
    let post = blog.find_post(ident).ok_or_else(|| anyhow!("No post named '{}'", ident))?;
    println!("{}", post.title());
    println!("Posted on {}", format_time(&post.created()));
    println!();
    println!("{}", post.content.raw);

    let comments = blog.comments(&post);
    println!("-- {}", pluralize(comments.len(), "comment"));
    for comment in comments.iter() {
        println!();
        println!("#{} {} on {}", comment.id, comment.name, format_time(&comment.created.naive_utc()));
        println!("{}", comment.body);
    }
    Ok(())
}

fn comment(blog: &Blog, ident: &str, author: &str, email: &str, body: &str) -> Result<()> {
    let post = blog.find_post(ident).ok_or_else(|| anyhow!("No post named '{}'", ident))?;
    let comment = blog.submit_comment(&post, author, email, body)?;
    info!("Comment {} added to '{}'", comment.id, post.ident());
    println!("Added comment {} to '{}'", comment.id, post.ident());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config_path.map(PathBuf::from);

    if let Command::Init = args.command {
        let path = config_path.unwrap_or_else(|| PathBuf::from(CFG_FILE_NAME));
        write_sample_cfg(&path)?;
        println!("Sample configuration written to {}", path.display());
        return Ok(());
    }

    let config = match open_config(config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{:#}", err);
            eprintln!("Please run chronicle --help");
            return Ok(());
        }
    };

    if let Err(err) = configure_logger(&config) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    let handler = start_notifier(&config)?;
    let notifier: Arc<dyn Notifier> = match handler {
        Some(ref handler) => Arc::new(handler.new_sender()),
        None => Arc::new(NotifySender::no_op()),
    };

    let blog = Blog::open(&config, notifier)?;
    let res = match args.command {
        Command::Init => Ok(()),
        Command::Check => check(&blog),
        Command::List => {
            list(&blog);
            Ok(())
        }
        Command::Show { ident } => show(&blog, &ident),
        Command::Comment { ident, author, email, body } => comment(&blog, &ident, &author, &email, &body),
    };

    // The blog holds the last sender; the outbox drains once it is gone
    drop(blog);
    if let Some(handler) = handler {
        handler.shutdown().await;
    }

    res
}
