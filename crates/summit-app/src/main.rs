//! Summit application binary - composition root.
//!
//! Ties the engine crates together into an interactive command-line diary:
//! 1. Load configuration from TOML
//! 2. Probe host capabilities (all four required, or exit)
//! 3. Select the folder and a document
//! 4. Start the voice dispatcher over stdin utterances
//! 5. Drive the session until it idles
//!
//! Each stdin line stands in for one finalized speech utterance, so the
//! command phrases ("사진", "글쓰기 시작", "글쓰기 끝", "종료"/"stop") work
//! exactly as they would against a real recognizer.

mod host;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use summit_assets::AssetResolver;
use summit_capture::PhotoCaptureService;
use summit_core::{CapabilityProbe, Coordinates, SessionMode, SummitConfig};
use summit_session::Session;
use summit_store::DocumentStore;
use summit_voice::{CommandClassifier, SpeechRecognizer, VoiceDispatcher};

use host::{
    CacheDirProvider, FileCameraService, FixedGeolocation, FsFolderPicker, HostCapabilities,
    StdinRecognizer,
};

/// Voice-driven Markdown diary engine.
#[derive(Debug, Parser)]
#[command(name = "summit", version)]
struct Cli {
    /// Folder holding the diary documents (convention: Documents/SummitCrew).
    #[arg(long)]
    folder: PathBuf,

    /// JPEG served by the emulated camera for the "take photo" command.
    #[arg(long)]
    camera_image: Option<PathBuf>,

    /// Fixed latitude reported by the emulated geolocation provider.
    #[arg(long)]
    latitude: Option<f64>,

    /// Fixed longitude reported by the emulated geolocation provider.
    #[arg(long)]
    longitude: Option<f64>,

    /// Config file path (default: $SUMMIT_CONFIG or ~/.summit/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Resolve the config file path (flag, SUMMIT_CONFIG env, or
/// ~/.summit/config.toml).
fn config_path(cli: &Cli) -> PathBuf {
    if let Some(path) = &cli.config {
        return path.clone();
    }
    if let Ok(path) = std::env::var("SUMMIT_CONFIG") {
        return PathBuf::from(path);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".summit").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_file = config_path(&cli);
    let config = SummitConfig::load_or_default(&config_file);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Summit v{}", env!("CARGO_PKG_VERSION"));

    // Capability probe gates everything; no partial functionality.
    let capabilities = HostCapabilities::detect(&cli.folder, cli.camera_image.as_deref());
    if !capabilities.all_available() {
        let missing: Vec<String> = capabilities
            .missing()
            .iter()
            .map(|c| c.to_string())
            .collect();
        eprintln!(
            "This environment is not supported (missing: {}).",
            missing.join(", ")
        );
        std::process::exit(1);
    }
    let Some(camera_image) = cli.camera_image else {
        // The probe already verified the camera source.
        std::process::exit(1);
    };

    // Capability providers.
    let position = match (cli.latitude, cli.longitude) {
        (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
        _ => None,
    };
    let capture = PhotoCaptureService::new(
        Arc::new(FileCameraService::new(camera_image)),
        Arc::new(FixedGeolocation::new(position)),
        &config.capture,
    );
    let provider = CacheDirProvider::new(std::env::temp_dir().join("summit-assets"))?;
    let resolver = AssetResolver::new(Arc::new(provider));
    let mut session = Session::new(DocumentStore::new(), capture, resolver);

    // Folder selection. Denial is surfaced and fatal here; an interactive
    // host would re-prompt instead.
    println!(
        "Opening folder {} (convention: {})",
        cli.folder.display(),
        config.folder.suggested_name
    );
    let entries = match session.select_folder(&FsFolderPicker::new(&cli.folder)).await {
        Ok(entries) => entries,
        Err(_) => {
            eprintln!("{}", session.status());
            std::process::exit(1);
        }
    };

    // Document selection over the same stdin the recognizer takes over.
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    if entries.is_empty() {
        println!("No documents yet. Enter a new file name ending in .md:");
    } else {
        for (index, entry) in entries.iter().enumerate() {
            println!("  [{}] {}", index, entry.name);
        }
        println!("Enter a number to open, or a new file name ending in .md:");
    }
    loop {
        let Some(line) = input.next_line().await? else {
            eprintln!("No document selected.");
            std::process::exit(1);
        };
        let choice = line.trim();
        if choice.is_empty() {
            continue;
        }
        let result = if let Ok(index) = choice.parse::<usize>() {
            match entries.get(index) {
                Some(entry) => session.open_document(&entry.name).await,
                None => {
                    println!("No entry [{}]; try again:", index);
                    continue;
                }
            }
        } else if entries.iter().any(|e| e.name == choice) {
            session.open_document(choice).await
        } else {
            session.create_document(choice).await
        };
        match result {
            Ok(()) => break,
            Err(e) => {
                println!("{} Try again:", e);
                continue;
            }
        }
    }
    println!("{}", session.status());

    // Voice dispatcher over the remaining stdin lines.
    let recognizer = Arc::new(StdinRecognizer::from_lines(
        config.speech.locale.clone(),
        input,
    ));
    let classifier = CommandClassifier::new(config.speech.phrases.clone());
    let (event_tx, mut events) = mpsc::channel(32);
    let dispatcher = VoiceDispatcher::new(
        Arc::clone(&recognizer) as Arc<dyn SpeechRecognizer>,
        classifier.clone(),
        session.mode_watch(),
        event_tx,
    );
    let dispatcher_task = tokio::spawn(dispatcher.run());

    let phrases = &config.speech.phrases;
    println!(
        "Commands: '{}' photo, '{}' edit, '{}' end edit, '{}'/'{}' stop.",
        phrases.capture, phrases.enter_edit, phrases.exit_edit, phrases.stop, phrases.stop_alt
    );

    while session.mode() != SessionMode::Idle {
        if session.mode() == SessionMode::Writing {
            // The dispatcher is paused in edit mode; read input directly and
            // apply it as dictation or commands, like the original textarea
            // plus its buttons.
            match recognizer.next_utterance().await {
                Ok(Some(line)) => {
                    let transcript = line.trim();
                    if transcript.is_empty() {
                        continue;
                    }
                    let command = classifier.classify(transcript, true);
                    session.handle_command(command).await;
                    println!("[{}] {}", session.mode(), session.status());
                }
                Ok(None) => break,
                Err(e) => {
                    println!("[{}] {}", session.mode(), e);
                }
            }
            continue;
        }

        match events.recv().await {
            Some(event) => {
                session.handle_event(event).await;
                println!("[{}] {}", session.mode(), session.status());
            }
            None => break,
        }
    }

    dispatcher_task.await?;
    println!("Final document:\n{}", session.current_text());
    Ok(())
}
