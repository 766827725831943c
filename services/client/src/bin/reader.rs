//! services/client/src/bin/reader.rs
//!
//! Command-line front end for the reader client. Every command prints JSON.

use clap::{Parser, Subcommand};
use client_lib::{config::Config, error::ClientError, reader::ReaderApp};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use triheart_core::{RenderMode, ShelfFilters};

#[derive(Parser)]
#[command(name = "reader")]
#[command(author, version, about = "TriHeart reader client", long_about = None)]
struct Cli {
    /// Render / coordinate mode (crop or origin); defaults to TRIHEART_RENDER_MODE
    #[arg(short, long, global = true)]
    mode: Option<RenderMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a page image and report whether it may be shown
    Page { book_id: String, page_no: u32 },

    /// Fetch terms, notes and attachments for a page
    Annotations { book_id: String, page_no: u32 },

    /// Sign an attachment object key
    AttachmentUrl { file_path: String },

    /// Search published books
    Search {
        #[arg(short, long)]
        keyword: Option<String>,

        /// Category filter; repeat for several
        #[arg(short, long = "category")]
        categories: Vec<String>,

        /// Sort token, e.g. "bookSalePrice,ASC"
        #[arg(short, long)]
        sort: Option<String>,

        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        size: Option<u32>,
    },

    /// Show a book with the signed-in user's progress
    Book { book_id: String },

    /// Record the last page read for a shelf relation
    Progress { relation_id: String, page_no: u32 },

    /// Put a book on the signed-in user's shelf
    AddToShelf { book_id: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ClientError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    let cli = Cli::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!(base_url = %config.base_url, "configuration loaded");

    // --- 2. Build the Reader ---
    let mode = cli.mode.unwrap_or(config.render_mode);
    let app = ReaderApp::from_config(config)?;

    // --- 3. Run the Command ---
    let result = run(&app, cli.command, mode).await;
    if let Err(e) = &result {
        error!("{}", e);
    }
    result
}

async fn run(app: &ReaderApp, command: Commands, mode: RenderMode) -> Result<(), ClientError> {
    match command {
        Commands::Page { book_id, page_no } => {
            let page = app.pages.resolve_page(&book_id, page_no, mode).await;
            if !page.is_allowed() {
                info!(book_id, page_no, status = ?page.status, "page not deliverable");
            }
            print_json(&page)
        }
        Commands::Annotations { book_id, page_no } => {
            print_json(&app.annotations.fetch_all(&book_id, page_no, mode).await)
        }
        Commands::AttachmentUrl { file_path } => {
            print_json(&app.annotations.resolve_attachment_url(&file_path).await)
        }
        Commands::Search {
            keyword,
            categories,
            sort,
            page,
            size,
        } => {
            let filters = ShelfFilters {
                keyword,
                categories,
                sort,
                page,
                size,
            };
            print_json(&app.shelf.search_books(&filters).await)
        }
        Commands::Book { book_id } => {
            let view = app
                .shelf
                .unified_view(&book_id)
                .await?
                .ok_or_else(|| ClientError::Internal(format!("book {} not found", book_id)))?;
            print_json(&serde_json::json!({
                "view": view,
                "progress": view.snapshot(),
            }))
        }
        Commands::Progress { relation_id, page_no } => {
            print_json(&app.shelf.update_last_read_page(&relation_id, page_no).await?)
        }
        Commands::AddToShelf { book_id } => {
            let user_id = app.user_id()?;
            print_json(&app.shelf.create_relation(&book_id, &user_id).await?)
        }
    }
}
