use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{EntityApi, NovelWriterClient, TemplateApi};
use shared::domain::{TemplateType, DEFAULT_NOVEL_NAME};
use tracing::info;
use tracing_subscriber::EnvFilter;
use writer_core::{
    BannerKind, ClassifiedFailure, DialogKind, EditorSession, RemoteCall, SessionOptions,
    WorkflowRunner,
};

mod config;

use config::load_settings;

#[derive(Parser, Debug)]
#[command(name = "novelwriter", about = "Drive NovelWriter workflows from the terminal")]
struct Args {
    /// Settings file; missing is fine.
    #[arg(long, default_value = "novelwriter.toml")]
    config: PathBuf,
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    bucket: Option<String>,
    #[arg(long)]
    novel: Option<String>,
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    mining_timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload the draft in FILE and append a generated continuation.
    Generate {
        file: PathBuf,
        /// Write the extended draft back to FILE instead of stdout.
        #[arg(long)]
        in_place: bool,
    },
    /// Fetch a stored story. KEY defaults to the configured story name.
    Load {
        #[arg(long)]
        key: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    AddEntity {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value = "")]
        relations: String,
        #[arg(long, default_value = "")]
        history: String,
    },
    /// Extract entities from the draft in FILE.
    Mine { file: PathBuf },
    /// Look up stored entities similar to QUERY.
    Similar {
        query: String,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show the active prompt template for the configured novel.
    Template {
        #[arg(value_enum)]
        kind: TemplateKind,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TemplateKind {
    Forecaster,
    NovelCompletion,
}

impl From<TemplateKind> for TemplateType {
    fn from(kind: TemplateKind) -> Self {
        match kind {
            TemplateKind::Forecaster => TemplateType::Forecaster,
            TemplateKind::NovelCompletion => TemplateType::NovelCompletion,
        }
    }
}

/// Dispatches `request`'s call, if any, and applies every completion.
async fn execute(
    runner: &mut WorkflowRunner,
    session: &mut EditorSession,
    request: impl FnOnce(&mut EditorSession) -> Option<RemoteCall>,
) {
    if let Some(call) = request(&mut *session) {
        runner.dispatch(call);
        runner.drain(session).await;
    }
}

fn fail_on(failure: Option<&ClassifiedFailure>) -> Result<()> {
    match failure {
        Some(failure) => bail!("{} error: {}", failure.kind().label(), failure.message()),
        None => Ok(()),
    }
}

fn emit(text: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write '{}'", path.display()))
        }
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

fn read_draft(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read '{}'", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config)?;
    if let Some(v) = args.api_url {
        settings.api_base_url = v;
    }
    if let Some(v) = args.bucket {
        settings.bucket = Some(v);
    }
    if let Some(v) = args.novel {
        settings.novel_name = Some(v);
    }
    if let Some(v) = args.username {
        settings.username = v;
    }
    if let Some(v) = args.mining_timeout_secs {
        settings.mining_timeout_secs = v;
    }
    settings.validate()?;

    let client = Arc::new(
        NovelWriterClient::new(&settings.api_base_url).context("failed to build api client")?,
    );
    let mut runner =
        WorkflowRunner::new(client.clone()).with_mining_deadline(settings.mining_deadline());
    let mut session = EditorSession::new(
        settings.session_configuration(),
        SessionOptions {
            username: settings.username.clone(),
        },
    );
    info!(api = %client.base_url(), "novelwriter ready");

    match args.command {
        Command::Generate { file, in_place } => {
            session.edit_text(read_draft(&file)?);
            execute(&mut runner, &mut session, EditorSession::request_generate).await;
            let banner = session
                .status()
                .current()
                .cloned()
                .context("generation did not run")?;
            if banner.kind == BannerKind::Error {
                bail!(banner.text);
            }
            emit(session.buffer().text(), in_place.then_some(file.as_path()))?;
            info!(words = session.word_count(), "{}", banner.text);
        }
        Command::Load { key, out } => {
            let key = key
                .or_else(|| settings.story_name.clone())
                .context("no --key given and no story_name configured")?;
            session.open_dialog(DialogKind::LoadStory);
            session.set_load_key(key);
            execute(&mut runner, &mut session, EditorSession::request_load).await;
            fail_on(session.load().state().failure())?;
            emit(session.buffer().text(), out.as_deref())?;
            info!(words = session.word_count(), "story loaded");
        }
        Command::AddEntity {
            name,
            description,
            relations,
            history,
        } => {
            session.open_dialog(DialogKind::AddEntity);
            {
                let form = session.entity_form_mut();
                form.name = name;
                form.description = description;
                form.relations = relations;
                form.history = history;
            }
            execute(&mut runner, &mut session, EditorSession::request_add_entity).await;
            fail_on(session.add_entity().state().failure())?;
            if let Some(banner) = session.status().current() {
                println!("{}", banner.text);
            }
        }
        Command::Mine { file } => {
            session.edit_text(read_draft(&file)?);
            session.open_dialog(DialogKind::MineEntities);
            execute(&mut runner, &mut session, EditorSession::request_mine).await;
            fail_on(session.mine().state().failure())?;
            if let Some(response) = session.mine().result() {
                println!("{}", serde_json::to_string_pretty(&response.result)?);
            }
            session.close_dialog(DialogKind::MineEntities);
            if let Some(banner) = session.status().current() {
                info!("{}", banner.text);
            }
        }
        Command::Similar { query, limit } => {
            let entities = client
                .similar_entities(&query, limit.unwrap_or(settings.similar_results))
                .await?;
            if entities.is_empty() {
                println!("no similar entities");
            }
            for entity in entities {
                match entity.distance {
                    Some(distance) => println!("[{distance:.3}] {}", entity.content),
                    None => println!("{}", entity.content),
                }
            }
        }
        Command::Template { kind } => {
            let novel_name = settings.novel_name.as_deref().unwrap_or(DEFAULT_NOVEL_NAME);
            let template = client.template(novel_name, kind.into()).await?;
            println!(
                "# {} / {} (version {})",
                template.novel_name, template.template_type, template.version
            );
            println!("{}", template.prompt_template);
        }
    }

    Ok(())
}
