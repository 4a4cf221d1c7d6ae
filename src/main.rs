use cardscan::capture::{CaptureSource, FileCapture};
use cardscan::config::{self, AppConfig};
use cardscan::extract::GeminiClient;
use cardscan::imaging::{EnhanceParams, ImageBackend, RustBackend, enhance};
use cardscan::orchestrator::{Orchestrator, ReviewDecision, ReviewHandler};
use cardscan::output;
use cardscan::preferences::{PreferenceSource, PreferenceStore};
use cardscan::record::{BusinessType, ContactRecord};
use cardscan::repository::{JsonFileStore, RecordStore};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

#[derive(Parser)]
#[command(name = "cardscan")]
#[command(about = "Turn photos of business cards and shop signs into contact records")]
#[command(long_about = "\
Turn photos of business cards and shop signs into contact records

Each scan enhances the photo (grayscale, contrast, sharpen), sends it to the
extraction service, and builds a contact record from whatever fields came
back. With auto-save on, the record is stored immediately; otherwise it is
shown for review first.

The API key is read from the environment variable named in the config
(GEMINI_API_KEY by default).

Run 'cardscan gen-config' to generate a documented cardscan.toml.")]
#[command(version)]
struct Cli {
    /// Config file (optional; defaults apply when missing)
    #[arg(long, default_value = "cardscan.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture a contact from a photo
    Scan {
        /// Photo of a business card, sign, or banner
        image: PathBuf,
        /// Save without review for this scan
        #[arg(long, conflicts_with = "review")]
        auto_save: bool,
        /// Review before saving for this scan
        #[arg(long)]
        review: bool,
    },
    /// Run only the enhancement stage and write the result
    Enhance {
        image: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List stored records, newest first
    List,
    /// Delete one record by id
    Delete { id: String },
    /// Delete every record
    Clear,
    /// Show or set the stored auto-save preference
    AutoSave {
        #[arg(value_enum)]
        state: Option<Toggle>,
    },
    /// Print a stock cardscan.toml with all options documented
    GenConfig,
}

#[derive(ValueEnum, Clone, Copy)]
enum Toggle {
    On,
    Off,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cardscan=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Scan {
            image,
            auto_save,
            review,
        } => {
            let ctx = Context::load(&cli.config)?;
            let preferences: Arc<dyn PreferenceSource> = if auto_save {
                Arc::new(true)
            } else if review {
                Arc::new(false)
            } else {
                Arc::new(PreferenceStore::open(ctx.config.storage.preferences_path()))
            };
            let orchestrator = Orchestrator::new(
                Arc::clone(&ctx.backend),
                Arc::new(extraction_client(&ctx.config)?),
                ctx.repository,
                preferences,
            );
            let source = FileCapture::new(image, ctx.backend);
            let reviewer = StdinReviewer::new();
            let result = orchestrator.capture_with_review(&source, &reviewer).await?;
            output::print_cycle_result(&result);
        }
        Command::Enhance { image, output: out } => {
            let backend: Arc<dyn ImageBackend> = Arc::new(RustBackend::new());
            let raw = FileCapture::new(&image, Arc::clone(&backend)).capture().await?;
            let enhanced = enhance(backend.as_ref(), raw, &EnhanceParams::default());
            if enhanced.is_empty() {
                return Err(format!("could not encode {}", image.display()).into());
            }
            write_file(&out, &enhanced.bytes)?;
            for line in output::format_enhanced(&out, &enhanced) {
                println!("{}", line);
            }
        }
        Command::List => {
            let ctx = Context::load(&cli.config)?;
            output::print_records(&ctx.repository.list_all());
        }
        Command::Delete { id } => {
            let ctx = Context::load(&cli.config)?;
            if ctx.repository.get(&id).is_none() {
                println!("No record with id {id}");
            } else {
                ctx.repository.delete(&id)?;
                println!("Deleted {id}");
            }
        }
        Command::Clear => {
            let ctx = Context::load(&cli.config)?;
            let count = ctx.repository.list_all().len();
            ctx.repository.delete_all()?;
            println!("Deleted {count} records");
        }
        Command::AutoSave { state } => {
            let ctx = Context::load(&cli.config)?;
            let store = PreferenceStore::open(ctx.config.storage.preferences_path());
            if let Some(state) = state {
                store.set_auto_save(matches!(state, Toggle::On))?;
            }
            println!(
                "Auto-save: {}",
                if store.auto_save() { "on" } else { "off" }
            );
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Everything the record commands share, built from the config file.
struct Context {
    config: AppConfig,
    backend: Arc<dyn ImageBackend>,
    repository: Arc<JsonFileStore>,
}

impl Context {
    fn load(path: &Path) -> Result<Self, config::ConfigError> {
        let config = config::load_config(path)?;
        let repository = Arc::new(JsonFileStore::new(config.storage.records_path()));
        Ok(Self {
            config,
            backend: Arc::new(RustBackend::new()),
            repository,
        })
    }
}

fn extraction_client(config: &AppConfig) -> Result<GeminiClient, Box<dyn std::error::Error>> {
    let client = GeminiClient::new(config.api_key()?)
        .with_endpoint(&config.extraction.endpoint)
        .with_model(&config.extraction.model)
        .with_timeout(config.extraction.timeout())?;
    Ok(client)
}

fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)
}

/// Review on the terminal: show the record, then save, edit, or discard.
struct StdinReviewer {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl StdinReviewer {
    fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    /// Prompt and read one trimmed line. End of input reads as empty.
    async fn ask(&self, prompt: &str) -> String {
        print!("{prompt}");
        let _ = std::io::stdout().flush();
        let mut lines = self.lines.lock().await;
        match lines.next_line().await {
            Ok(Some(line)) => line.trim().to_string(),
            _ => String::new(),
        }
    }

    /// Walk every field; an empty answer keeps the current value.
    async fn edit(&self, record: &ContactRecord) -> ContactRecord {
        let mut edited = record.clone();
        let fields: [(&str, &mut String); 9] = [
            ("Company", &mut edited.company_name),
            ("Contact", &mut edited.contact_person),
            ("Phone", &mut edited.contact_number),
            ("WhatsApp", &mut edited.whatsapp_number),
            ("Email", &mut edited.email),
            ("Website", &mut edited.website),
            ("Address", &mut edited.address),
            ("Business", &mut edited.nature_of_business),
            ("Notes", &mut edited.notes),
        ];
        for (label, value) in fields {
            let answer = self.ask(&format!("  {label} [{value}]: ")).await;
            if !answer.is_empty() {
                *value = answer;
            }
        }
        let answer = self
            .ask(&format!(
                "  Type ({}) [{}]: ",
                BusinessType::ALL.map(|t| t.as_str()).join("/"),
                edited.business_type
            ))
            .await;
        if !answer.is_empty() {
            edited.business_type = BusinessType::normalize(&answer);
        }
        edited
    }
}

#[async_trait::async_trait]
impl ReviewHandler for StdinReviewer {
    async fn review(&self, record: &ContactRecord) -> ReviewDecision {
        for line in output::format_review(record) {
            println!("{}", line);
        }
        loop {
            let answer = self.ask("Save? [y]es / [e]dit / [N]o: ").await;
            match answer.to_ascii_lowercase().as_str() {
                "y" | "yes" => return ReviewDecision::Confirm(record.clone()),
                "e" | "edit" => return ReviewDecision::Confirm(self.edit(record).await),
                "" | "n" | "no" => return ReviewDecision::Discard,
                _ => continue,
            }
        }
    }
}
