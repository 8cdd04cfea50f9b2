use clap::Parser;
use numslider::messaging::NotificationConsumer;
use numslider::project::validate_playable;
use numslider::sequencer::ProofImage;
use numslider::session::snapshot::WINDOW_RADIUS;
use numslider::{
    ActiveProjectCache, AppConfig, Announcer, HttpBackend, MemoryStore, NotificationSender,
    PlayerSession, PlayerState, ProgressStore, ProjectId, ProjectSource, SequenceDescriptor,
    SessionContext, SessionHandle, SessionOptions, UserContext, create_notification_channel,
    fetch_with_cache, logging, speech,
};
use ringbuf::traits::Consumer;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// How often queued notifications are printed
const NOTIFICATION_POLL: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(version, about = "Plays a verification number sequence aloud")]
struct Cli {
    /// Config file (defaults to <config dir>/numslider/config.ron)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend base URL, overrides config and NUMSLIDER_API_URL
    #[arg(long)]
    api_url: Option<String>,

    #[arg(long)]
    user_id: Option<String>,

    #[arg(long)]
    project_id: String,

    /// Play a project JSON file without the backend; progress is written back to it
    #[arg(long)]
    offline: Option<PathBuf>,

    /// Log announcements instead of speaking them
    #[arg(long)]
    mute: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    logging::init();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let user_id = cli
        .user_id
        .clone()
        .or_else(|| config.user_id.clone())
        .ok_or("no user id: pass --user-id or set user_id in the config file")?;
    let context = SessionContext::new(UserContext::new(user_id), ProjectId::new(&cli.project_id));

    println!("=== numslider ===");
    println!("Version {}\n", env!("CARGO_PKG_VERSION"));

    match &cli.offline {
        Some(path) => {
            let file = ActiveProjectCache::new(path);
            let project = file
                .load()?
                .ok_or_else(|| format!("offline project file {} not found", path.display()))?;
            let store = MemoryStore::with_project(project);

            play(store.clone(), store.clone(), context.clone(), &config).await?;

            if let Some(project) = store.project(&context.project_id) {
                file.save(&project)?;
                println!("Progress written to {}", path.display());
            }
        }
        None => {
            let backend = HttpBackend::new(&config.api_base_url, config.request_timeout())?;
            play(backend.clone(), backend, context, &config).await?;
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<AppConfig, Box<dyn Error>> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => AppConfig::default_path()?,
    };

    let mut config = AppConfig::load(&path)?.apply_env();
    if let Some(url) = &cli.api_url {
        config.api_base_url = url.clone();
    }
    if cli.mute {
        config.speech.enabled = false;
    }
    config.validate()?;

    tracing::debug!(path = %path.display(), api = %config.api_base_url, "configuration loaded");
    Ok(config)
}

async fn play<S, P>(
    store: S,
    source: P,
    context: SessionContext,
    config: &AppConfig,
) -> Result<(), Box<dyn Error>>
where
    S: ProgressStore,
    P: ProjectSource,
{
    let cache = ActiveProjectCache::in_data_dir()
        .inspect_err(|e| tracing::warn!(error = %e, "playing without a cached project fallback"))
        .ok();
    let project =
        fetch_with_cache(&source, cache.as_ref(), &context.user, &context.project_id).await?;
    validate_playable(&project)?;

    println!("Project: {} ({})", project.project_name, project.status.label());
    println!("Progress: {}", project.progress_label());
    if let Some(time) = &project.passed_time {
        println!("Time already spent: {}", time);
    }
    println!();

    let (producer, consumer) = create_notification_channel(config.notification_capacity);
    let announcer: Box<dyn Announcer> = speech::system_announcer(&config.speech);
    let (session, handle) = PlayerSession::new(
        context,
        SequenceDescriptor::from_project(&project),
        store,
        announcer,
        NotificationSender::new(producer),
        SessionOptions::from(config),
    );

    // The announcer may be tied to this thread, so the session is joined rather than spawned
    let (result, ()) = tokio::join!(session.run(), repl(handle, consumer));
    result?;
    Ok(())
}

async fn repl(handle: SessionHandle, mut notifications: NotificationConsumer) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut snapshots = handle.subscribe();
    let mut poll = tokio::time::interval(NOTIFICATION_POLL);
    let mut last_shown: Option<(PlayerState, usize)> = None;

    print_help();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => match respond(line.trim(), &handle).await {
                    Ok(true) => break,
                    Ok(false) => {}
                    Err(err) => println!("error: {}", err),
                },
                Ok(None) => {
                    // stdin closed
                    let _ = handle.shutdown().await;
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to read stdin");
                    let _ = handle.shutdown().await;
                    break;
                }
            },

            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                let key = (snapshot.state, snapshot.current_index);
                if last_shown != Some(key) {
                    println!("{}", snapshot);
                    last_shown = Some(key);
                }
            },

            _ = poll.tick() => {
                for notification in notifications.pop_iter() {
                    println!("{}", notification);
                }
            },
        }
    }

    for notification in notifications.pop_iter() {
        println!("{}", notification);
    }
}

async fn respond(line: &str, handle: &SessionHandle) -> Result<bool, Box<dyn Error>> {
    let (command, rest) = match line.split_once(' ') {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    let note = (!rest.is_empty()).then(|| rest.to_string());

    match command {
        "" => {}
        "p" => handle.pause(note).await?,
        "n" => handle.annotate(note.ok_or("usage: n <note>")?).await?,
        "r" => handle.resume().await?,
        "b" => handle.step_back().await?,
        "f" => handle.step_forward().await?,
        "s" => {
            let position: usize = rest.parse().map_err(|_| "usage: s <position>")?;
            let index = position.checked_sub(1).ok_or("positions start at 1")?;
            handle.seek(index).await?;
        }
        "c" => {
            let proof = match note {
                Some(path) => Some(ProofImage::from_file(path)?),
                None => None,
            };
            handle.report_completion(proof).await?;
            println!("Task submitted for review");
        }
        "w" => print_window(handle),
        "h" | "?" => print_help(),
        "q" => {
            handle.shutdown().await?;
            return Ok(true);
        }
        other => println!("unknown command '{}', h for help", other),
    }

    Ok(false)
}

fn print_window(handle: &SessionHandle) {
    let snapshot = handle.snapshot();
    let cells: Vec<String> = snapshot
        .window
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let value = value.as_deref().unwrap_or("·");
            if i == WINDOW_RADIUS {
                format!("[{}]", value)
            } else {
                format!(" {} ", value)
            }
        })
        .collect();
    println!("{}   {}", cells.join(" "), snapshot.position_label());
}

fn print_help() {
    println!("Commands:");
    println!("  p [note]    pause, optionally with a note");
    println!("  n <note>    note for the current pause");
    println!("  r           resume");
    println!("  b / f       step back / forward (while paused)");
    println!("  s <n>       jump to position n");
    println!("  c [image]   report completion, optionally with a proof image");
    println!("  w           show the values around the current one");
    println!("  q           quit\n");
}
