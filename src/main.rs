use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use entitytagger::annotation::{OffsetRange, SpanId};
use entitytagger::config::Config;
use entitytagger::palette::Palette;
use entitytagger::session::EditorSession;
use entitytagger::store::AnnotationBackend;
use entitytagger::store::fs::FileStore;
use entitytagger::store::http::HttpStore;
use entitytagger::web::server::{AppContext, AppServer};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "entitytagger", version, about = "Named-entity span annotation tool")]
struct Cli {
    /// Path to the JSON config file (default: config.json)
    #[arg(short, long, global = true, default_value = "")]
    config: String,

    /// Override the document directory
    #[arg(long, global = true)]
    text_dir: Option<String>,

    /// Override the annotation directory
    #[arg(long, global = true)]
    annotations_dir: Option<String>,

    /// Work against a running server instead of the local directories
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the web editor (default)
    Serve {
        /// Address to listen on, e.g. 127.0.0.1:5000
        #[arg(long)]
        bind: Option<String>,
    },
    /// List documents; annotated ones are marked with ✓
    List,
    /// Print the spans of a document
    Show { file: String },
    /// Print a document as highlighted HTML
    Render { file: String },
    /// Tag a character range with a class and save
    Tag {
        file: String,
        #[arg(long)]
        start: usize,
        #[arg(long)]
        end: usize,
        #[arg(long)]
        class: String,
    },
    /// Remove a span by id, or the first span matching class and text
    Untag {
        file: String,
        #[arg(long, conflicts_with_all = ["class", "text"])]
        id: Option<u64>,
        #[arg(long, requires = "text")]
        class: Option<String>,
        #[arg(long, requires = "class")]
        text: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(dir) = cli.text_dir {
        config.text_files_dir = dir;
    }
    if let Some(dir) = cli.annotations_dir {
        config.annotations_dir = dir;
    }
    if let Some(Command::Serve { bind: Some(bind) }) = &cli.command {
        config.bind = bind.clone();
    }
    config.validate().context("invalid configuration")?;

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { .. } => serve(config),
        command => {
            let backend: Box<dyn AnnotationBackend> = match &cli.server {
                Some(url) => Box::new(HttpStore::new(url)?),
                None => Box::new(FileStore::from_config(&config)?),
            };
            run_command(command, &config, backend.as_ref())
        }
    }
}

fn serve(config: Config) -> Result<()> {
    tracing::info!("Starting {}...", config.title);
    let store = FileStore::from_config(&config).context("failed to open annotation store")?;
    let server = AppServer::new(AppContext::new(config, store));

    tokio::runtime::Runtime::new()
        .context("failed to start async runtime")?
        .block_on(server.start())
}

fn open_session(
    backend: &dyn AnnotationBackend,
    config: &Config,
    file: &str,
) -> Result<EditorSession> {
    let palette = Arc::new(Palette::from_config(&config.palette));
    let session = EditorSession::open(
        backend,
        file,
        palette,
        config.auto_save_interval(),
        Instant::now(),
    )?;
    if session.file().is_empty() {
        bail!("unknown document: {file}");
    }
    Ok(session)
}

fn run_command(command: Command, config: &Config, backend: &dyn AnnotationBackend) -> Result<()> {
    match command {
        Command::Serve { .. } => unreachable!("handled by main"),
        Command::List => {
            let listing = backend.list_documents()?;
            for file in &listing.files {
                let mark = if listing.is_annotated(file) { " ✓" } else { "" };
                println!("{file}{mark}");
            }
        }
        Command::Show { file } => {
            let session = open_session(backend, config, &file)?;
            for entry in session.annotations().iter() {
                let span = &entry.span;
                println!(
                    "{}\t{}\t{}\t{:?}",
                    entry.id,
                    span.range(),
                    span.class,
                    span.text
                );
            }
        }
        Command::Render { file } => {
            let session = open_session(backend, config, &file)?;
            println!("{}", session.render_html());
        }
        Command::Tag {
            file,
            start,
            end,
            class,
        } => {
            let mut session = open_session(backend, config, &file)?;
            let id = session.annotate(OffsetRange::new(start, end), &class)?;
            session.save(backend, Instant::now())?;
            let span = session.annotations().get(id).map(|s| s.text.as_str());
            println!("Tagged {:?} as {class} in {file}", span.unwrap_or_default());
        }
        Command::Untag {
            file,
            id,
            class,
            text,
        } => {
            let mut session = open_session(backend, config, &file)?;
            let removed = match (id, class, text) {
                (Some(id), _, _) => session.remove(SpanId(id)),
                (None, Some(class), Some(text)) => session.remove_first_match(&class, &text),
                _ => bail!("either --id or both --class and --text are required"),
            };
            let Some(span) = removed else {
                bail!("no matching span in {file}");
            };
            session.save(backend, Instant::now())?;
            println!("Removed {} span {:?} from {file}", span.class, span.text);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{TempDir, tempdir};

    fn fixture() -> (TempDir, FileStore) {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("text"), dir.path().join("ann")).unwrap();
        std::fs::write(store.text_dir().join("fox.txt"), "The quick brown fox").unwrap();
        (dir, store)
    }

    fn untag(id: Option<u64>, class: Option<&str>, text: Option<&str>) -> Command {
        Command::Untag {
            file: "fox.txt".to_string(),
            id,
            class: class.map(str::to_string),
            text: text.map(str::to_string),
        }
    }

    #[test]
    fn test_untag_argument_rules() {
        let parse = |args: &[&str]| {
            Cli::try_parse_from(["entitytagger", "untag", "fox.txt"].iter().chain(args))
        };
        assert!(parse(&["--id", "0"]).is_ok());
        assert!(parse(&["--class", "OTHER", "--text", "fox"]).is_ok());
        assert!(parse(&["--class", "OTHER"]).is_err());
        assert!(parse(&["--id", "0", "--class", "OTHER", "--text", "fox"]).is_err());
    }

    #[test]
    fn test_unknown_document_fails() {
        let (_dir, store) = fixture();
        let config = Config::default();
        let err = run_command(Command::Show { file: "missing.txt".to_string() }, &config, &store)
            .unwrap_err();
        assert!(err.to_string().contains("unknown document"));
    }

    #[test]
    fn test_tag_then_untag() {
        let (_dir, store) = fixture();
        let config = Config::default();
        let tag = |start, end, class: &str| Command::Tag {
            file: "fox.txt".to_string(),
            start,
            end,
            class: class.to_string(),
        };

        run_command(tag(16, 19, "OTHER"), &config, &store).unwrap();
        run_command(tag(4, 9, "PRODUCT"), &config, &store).unwrap();
        assert!(run_command(tag(17, 19, "ORG"), &config, &store).is_err());
        assert!(run_command(tag(0, 3, "NOT_A_CLASS"), &config, &store).is_err());
        assert_eq!(store.load_document("fox.txt").unwrap().annotations.len(), 2);

        // Neither an id nor a class/text pair.
        assert!(run_command(untag(None, Some("OTHER"), None), &config, &store).is_err());
        // Nothing matches.
        assert!(run_command(untag(None, Some("ORG"), Some("fox")), &config, &store).is_err());

        run_command(untag(None, Some("OTHER"), Some("fox")), &config, &store).unwrap();
        let spans = store.load_document("fox.txt").unwrap().annotations;
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "quick");

        // Ids follow the order of the stored file.
        run_command(untag(Some(0), None, None), &config, &store).unwrap();
        assert!(store.load_document("fox.txt").unwrap().annotations.is_empty());
        assert!(run_command(untag(Some(0), None, None), &config, &store).is_err());
    }
}
