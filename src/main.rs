mod app;
mod article_admin;
mod article_detail;
mod articles;
mod cache;
mod config;
mod contact;
mod db;
mod filter;
mod gallery;
mod logging;
mod model;
mod quote;
mod sample;
mod source;
mod ui;
mod upload;

use app::{App, View};
use article_admin::NewArticle;
use article_detail::DetailTab;
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use config::AppConfig;
use contact::ContactForm;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use db::Database;
use indicatif::{ProgressBar, ProgressStyle};
use model::{ViewCategory, WorkCategory};
use quote::{Quote, Tier};
use source::{ArticleAdmin, ArticleSource, SourceError, WorksSource};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use upload::{CloudinaryClient, ImageHost};

/// Terminal admin for the SP Warehouse works gallery and articles
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the SQLite database file (overrides the config file)
    #[arg(short, long, global = true)]
    db: Option<PathBuf>,

    /// Config file to read instead of the default location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output: -v for debug, -vv for trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse works and articles (default)
    Run {
        /// Articles route to start from, e.g. "/articles?category=Design"
        #[arg(long, default_value = articles::ARTICLES_PATH)]
        route: String,
        /// Gallery category to start from
        #[arg(long)]
        category: Option<String>,
    },
    /// Fill the database with demo works and articles
    Seed,
    /// Upload images to the image host and add them as works
    Upload {
        /// Image files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, default_value = "warehouse")]
        category: WorkCategory,
        #[arg(long, default_value = "exterior")]
        view: ViewCategory,
        /// Folder under sp-warehouse/ on the image host
        #[arg(long, default_value = "works")]
        folder: String,
    },
    /// Store a contact inquiry read as JSON from a file or stdin
    Contact {
        /// JSON file; stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Manage articles, drafts included
    Articles {
        #[command(subcommand)]
        action: ArticleAction,
    },
    /// Estimate the price of a warehouse from its floor size
    Quote {
        /// Width in metres
        #[arg(long)]
        width: f64,
        /// Length in metres
        #[arg(long)]
        length: f64,
        /// basic, standard or premium
        #[arg(long, default_value = "standard")]
        package: Tier,
    },
}

#[derive(Subcommand)]
enum ArticleAction {
    /// List every article, newest first
    List,
    /// Categories offered for new articles
    Categories,
    /// Create an article from JSON read from a file or stdin
    New {
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Publish a draft, or turn a published article back into a draft
    TogglePublish { slug: String },
    /// Delete an article
    Delete { slug: String },
}

fn read_input(input: Option<PathBuf>) -> std::io::Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Pure calculation: no config, log file or database needed
    if let Some(Commands::Quote { width, length, package }) = &cli.command {
        let quote = Quote::calculate(*width, *length, *package)?;
        println!("{}", quote.summary());
        return Ok(());
    }

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.database = db;
    }
    logging::init_logging(&config.log_file, cli.verbose)?;
    if let Some(parent) = config.database.parent() {
        std::fs::create_dir_all(parent)?;
    }
    info!(db = %config.database.display(), "starting");

    let database = Database::open(&config.database).await?;

    let command = cli.command.unwrap_or(Commands::Run {
        route: articles::ARTICLES_PATH.to_string(),
        category: None,
    });

    match command {
        Commands::Seed => seed(&database).await?,
        Commands::Upload {
            files,
            category,
            view,
            folder,
        } => {
            let host = CloudinaryClient::from_config(&config.image_host).map_err(|e| e.user_message())?;
            upload_files(&database, &host, &files, category, view, &folder).await?;
        }
        Commands::Contact { input } => {
            let raw = read_input(input)?;
            let form: ContactForm = serde_json::from_str(&raw)?;
            let received_at = Utc::now();
            form.submit(&database, received_at).await?;
            println!("{}", form.summary(received_at));
        }
        Commands::Articles { action } => manage_articles(&database, action).await?,
        // handled before any setup
        Commands::Quote { .. } => {}
        Commands::Run { route, category } => {
            let image_host = match CloudinaryClient::from_config(&config.image_host) {
                Ok(host) => Some(host),
                Err(e) => {
                    info!(reason = %e, "image cleanup disabled");
                    None
                }
            };

            let mut app = App::new(database, image_host, config.page_size, config.cache_ttl(), &route)
                .with_initial_category(category.as_deref());
            app.init().await;

            // Init terminal
            let mut terminal = ratatui::init();

            let result = run_app(&mut terminal, &mut app).await;

            // Restore terminal
            ratatui::restore();

            if let Err(e) = result {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn seed(db: &Database) -> Result<(), SourceError> {
    let works = sample::works();
    for w in &works {
        db.insert_work(&w.image_ref, w.category, w.view_category, w.created_at)
            .await?;
    }
    let mut added = 0;
    for a in sample::articles() {
        match db.create_article(&a).await {
            Ok(_) => added += 1,
            Err(SourceError::Duplicate { value, .. }) => {
                eprintln!("Skipping article {value}: slug already exists");
            }
            Err(e) => return Err(e),
        }
    }
    eprintln!("Added {} works and {} articles.", works.len(), added);
    Ok(())
}

async fn manage_articles(db: &Database, action: ArticleAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ArticleAction::List => {
            let articles = db.fetch_all_articles().await?;
            for a in &articles {
                println!(
                    "{:<9} {}  {:<40} {:<20} {:>6} views  {}",
                    if a.published { "published" } else { "draft" },
                    a.created_at.format("%Y-%m-%d"),
                    a.slug,
                    a.category_name().unwrap_or("-"),
                    a.view_count,
                    a.title
                );
            }
            eprintln!("{} article(s)", articles.len());
        }
        ArticleAction::Categories => {
            let articles = db.fetch_all_articles().await?;
            for category in article_admin::category_options(&articles) {
                println!("{category}");
            }
        }
        ArticleAction::New { input } => {
            let new: NewArticle = serde_json::from_str(&read_input(input)?)?;
            let article = article_admin::create_article(db, new, Utc::now()).await?;
            println!("{}/{}", articles::ARTICLES_PATH, article.slug);
        }
        ArticleAction::TogglePublish { slug } => {
            let published = article_admin::toggle_publish(db, &slug, Utc::now()).await?;
            println!("{slug}: {}", if published { "published" } else { "draft" });
        }
        ArticleAction::Delete { slug } => {
            article_admin::delete_article(db, &slug).await?;
            println!("{slug}: deleted");
        }
    }
    Ok(())
}

async fn upload_files<H: ImageHost>(
    db: &Database,
    host: &H,
    files: &[PathBuf],
    category: WorkCategory,
    view: ViewCategory,
    folder: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")?
        .progress_chars("#>-"));

    let mut failed = 0;
    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());
        pb.set_message(name.clone());

        let result = async {
            let bytes = tokio::fs::read(path).await?;
            let image = host.upload(bytes, &name, folder).await?;
            db.insert_work(&image.url, category, view, Utc::now()).await?;
            Ok::<_, Box<dyn std::error::Error>>(image)
        }
        .await;

        match result {
            Ok(image) => info!(file = %name, url = %image.url, "work added"),
            Err(e) => {
                failed += 1;
                warn!(file = %name, error = %e, "upload failed");
                pb.println(format!("{name}: {e}"));
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message("Upload complete");
    if failed > 0 {
        return Err(format!("{failed} of {} uploads failed", files.len()).into());
    }
    Ok(())
}

async fn run_app<S, H>(
    terminal: &mut ratatui::DefaultTerminal,
    app: &mut App<S, H>,
) -> Result<(), Box<dyn std::error::Error>>
where
    S: WorksSource + ArticleSource,
    H: ImageHost,
{
    loop {
        terminal.draw(|frame| ui::render(app, frame))?;

        if app.should_quit {
            return Ok(());
        }

        // Poll for events with a 250ms timeout
        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key).await;
                }
            }
        }

        // Filter changes apply once the queue has drained
        if !event::poll(Duration::ZERO)? {
            app.settle();
        }
    }
}

async fn handle_key<S, H>(app: &mut App<S, H>, key: KeyEvent)
where
    S: WorksSource + ArticleSource,
    H: ImageHost,
{
    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.pending_delete.is_some() {
        match key.code {
            KeyCode::Char('y') => app.confirm_delete().await,
            _ => app.cancel_delete(),
        }
        return;
    }

    if app.edit.is_some() {
        handle_edit_key(app, key).await;
        return;
    }

    // Help toggle (global)
    if key.code == KeyCode::Char('?') {
        app.show_help = !app.show_help;
        return;
    }

    // If help is showing, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match app.view {
        View::Works => handle_works_key(app, key).await,
        View::Articles => handle_articles_key(app, key).await,
        View::ArticleDetail => handle_detail_key(app, key).await,
    }
}

async fn handle_edit_key<S, H>(app: &mut App<S, H>, key: KeyEvent)
where
    S: WorksSource + ArticleSource,
    H: ImageHost,
{
    let Some(draft) = app.edit.as_mut() else { return };
    match key.code {
        KeyCode::Left | KeyCode::Char('h') => draft.cycle_category(false),
        KeyCode::Right | KeyCode::Char('l') => draft.cycle_category(true),
        KeyCode::Up | KeyCode::Char('k') => draft.cycle_view(false),
        KeyCode::Down | KeyCode::Char('j') => draft.cycle_view(true),
        KeyCode::Enter => app.submit_edit().await,
        KeyCode::Esc => app.cancel_edit(),
        _ => {}
    }
}

async fn handle_works_key<S, H>(app: &mut App<S, H>, key: KeyEvent)
where
    S: WorksSource + ArticleSource,
    H: ImageHost,
{
    if app.gallery.lightbox_item().is_some() {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => app.gallery.close_lightbox(),
            KeyCode::Right | KeyCode::Char('l') => app.gallery.lightbox_step(true),
            KeyCode::Left | KeyCode::Char('h') => app.gallery.lightbox_step(false),
            KeyCode::Char('e') => app.begin_edit(),
            KeyCode::Char('d') => app.request_delete(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Tab | KeyCode::Char('2') => app.show_articles(),
        KeyCode::Down | KeyCode::Char('j') => app.gallery.cursor_next(),
        KeyCode::Up | KeyCode::Char('k') => app.gallery.cursor_prev(),
        KeyCode::Enter => {
            app.gallery.open_highlighted();
        }
        KeyCode::Char('c') => app.gallery.cycle_category(true),
        KeyCode::Char('C') => app.gallery.cycle_category(false),
        KeyCode::Char('v') => app.gallery.cycle_view(true),
        KeyCode::Char('V') => app.gallery.cycle_view(false),
        KeyCode::Char('x') => app.gallery.clear_filters(),
        KeyCode::Char('m') => {
            if !app.gallery.load_more() {
                app.status_msg = "All matching works are shown".to_string();
            }
        }
        KeyCode::Char('r') => app.retry().await,
        KeyCode::Char('e') => app.begin_edit(),
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char('s') => {
            app.gallery.toggle_selection_mode();
            app.status_msg = if app.gallery.selection_mode() {
                "Selection mode: space to select, d to delete".to_string()
            } else {
                String::new()
            };
        }
        KeyCode::Char(' ') => {
            if let Some(id) = app.gallery.highlighted().map(|w| w.id) {
                app.gallery.toggle_selected(id);
            }
        }
        KeyCode::Esc => {
            if app.gallery.selection_mode() {
                app.gallery.toggle_selection_mode();
            }
            app.dismiss_error();
        }
        _ => {}
    }
}

async fn handle_articles_key<S, H>(app: &mut App<S, H>, key: KeyEvent)
where
    S: WorksSource + ArticleSource,
    H: ImageHost,
{
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Tab | KeyCode::Char('1') => app.show_works().await,
        KeyCode::Down | KeyCode::Char('j') => app.articles.cursor_next(),
        KeyCode::Up | KeyCode::Char('k') => app.articles.cursor_prev(),
        KeyCode::Char('c') | KeyCode::Right => app.cycle_article_category(true),
        KeyCode::Char('C') | KeyCode::Left => app.cycle_article_category(false),
        KeyCode::Enter => app.open_article().await,
        KeyCode::Char('r') => app.retry().await,
        KeyCode::Esc => app.dismiss_error(),
        _ => {}
    }
}

async fn handle_detail_key<S, H>(app: &mut App<S, H>, key: KeyEvent)
where
    S: WorksSource + ArticleSource,
    H: ImageHost,
{
    let Some(detail) = app.detail.as_mut() else {
        app.close_article();
        return;
    };
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.close_article(),
        KeyCode::Tab | KeyCode::BackTab => detail.tab = detail.tab.next(),
        KeyCode::Char('1') => detail.tab = DetailTab::Content,
        KeyCode::Char('2') => detail.tab = DetailTab::Related,
        KeyCode::PageDown => detail.scroll_page_down(),
        KeyCode::PageUp => detail.scroll_page_up(),
        KeyCode::Down | KeyCode::Char('j') => match detail.tab {
            DetailTab::Content => detail.scroll_down(),
            DetailTab::Related => detail.related_next(),
        },
        KeyCode::Up | KeyCode::Char('k') => match detail.tab {
            DetailTab::Content => detail.scroll_up(),
            DetailTab::Related => detail.related_prev(),
        },
        KeyCode::Enter if detail.tab == DetailTab::Related => app.open_article().await,
        _ => {}
    }
}
