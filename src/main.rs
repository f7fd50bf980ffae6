use clap::{ArgMatches, Args, CommandFactory, FromArgMatches, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use photobooth::camera::{CaptureSession, CountdownOutcome, StillCamera};
use photobooth::share::share_url;
use photobooth::state::overlay::Point;
use photobooth::{Compositor, Config, EditSession, Library, PhotoService};

#[derive(Parser)]
#[command(name = "photobooth")]
#[command(about = "Photo booth: filters, stickers and shareable photos")]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/photobooth/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database, overrides the config file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Base URL for share links, overrides the config file
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply filters and overlays to an image file
    Compose {
        /// Base image
        input: PathBuf,

        /// Output PNG
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        edit: EditArgs,
    },

    /// Count down, grab a frame from a still image "camera", then compose
    Capture {
        /// Image served by the still camera
        #[arg(long)]
        camera: PathBuf,

        /// Output PNG
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        edit: EditArgs,
    },

    /// Compose and save a photo, printing its share link
    Save {
        /// Base image
        input: PathBuf,

        /// Owner id
        #[arg(long)]
        owner: String,

        /// Share token to use instead of a generated one
        #[arg(long)]
        token: Option<String>,

        #[command(flatten)]
        edit: EditArgs,
    },

    /// Show a photo by id
    Get { id: String },

    /// Resolve a share token to its public photo
    Share { token: String },

    /// Print the share URL of a token and write its QR code
    Link {
        token: String,

        /// QR code PNG to write
        #[arg(long)]
        qr: Option<PathBuf>,
    },

    /// Delete a photo
    Delete {
        id: String,

        /// Owner id; only the owner may delete
        #[arg(long)]
        owner: String,
    },

    /// List photos, newest first
    List {
        #[arg(long)]
        owner: Option<String>,

        #[arg(long)]
        limit: Option<u32>,

        #[arg(long)]
        offset: Option<u32>,
    },
}

#[derive(Args, Clone)]
struct EditArgs {
    /// Brightness percentage (0-200)
    #[arg(long, default_value = "100")]
    brightness: f32,

    /// Contrast percentage (0-200)
    #[arg(long, default_value = "100")]
    contrast: f32,

    #[arg(long)]
    grayscale: bool,

    #[arg(long)]
    sepia: bool,

    /// Sticker as GLYPH@X,Y in image pixels (repeatable)
    #[arg(long = "sticker")]
    stickers: Vec<Placement>,

    /// Caption as TEXT@X,Y in image pixels (repeatable)
    #[arg(long = "text")]
    texts: Vec<Placement>,
}

/// `value@x,y` from the command line
#[derive(Debug, Clone)]
struct Placement {
    value: String,
    position: Point,
}

impl FromStr for Placement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, coords) = s
            .rsplit_once('@')
            .ok_or_else(|| format!("expected VALUE@X,Y, got {:?}", s))?;
        let (x, y) = coords
            .split_once(',')
            .ok_or_else(|| format!("expected X,Y after '@', got {:?}", coords))?;
        let x: f32 = x.trim().parse().map_err(|e| format!("bad x {:?}: {}", x, e))?;
        let y: f32 = y.trim().parse().map_err(|e| format!("bad y {:?}: {}", y, e))?;
        Ok(Self {
            value: value.to_string(),
            position: Point::new(x, y),
        })
    }
}

/// One overlay flag, in command-line order
#[derive(Debug, Clone)]
enum OverlayArg {
    Sticker(Placement),
    Text(Placement),
}

/// Merge `--sticker` and `--text` back into the order they were given
///
/// Overlays paint in list order, so interleaved flags must stay interleaved.
fn overlay_order(edit: &EditArgs, matches: Option<&ArgMatches>) -> Vec<OverlayArg> {
    let indices = |id: &str| -> Vec<usize> {
        matches
            .and_then(|m| m.indices_of(id))
            .map(|i| i.collect())
            .unwrap_or_default()
    };
    let sticker_at = indices("stickers");
    let text_at = indices("texts");

    let mut ordered: Vec<(usize, OverlayArg)> = Vec::new();
    for (i, sticker) in edit.stickers.iter().enumerate() {
        let at = sticker_at.get(i).copied().unwrap_or(usize::MAX);
        ordered.push((at, OverlayArg::Sticker(sticker.clone())));
    }
    for (i, text) in edit.texts.iter().enumerate() {
        let at = text_at.get(i).copied().unwrap_or(usize::MAX);
        ordered.push((at, OverlayArg::Text(text.clone())));
    }
    ordered.sort_by_key(|(at, _)| *at);
    ordered.into_iter().map(|(_, overlay)| overlay).collect()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG controls verbosity, e.g. RUST_LOG=photobooth=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    let sub_matches = matches.subcommand().map(|(_, m)| m);

    let mut config = Config::load(cli.config.clone().unwrap_or_else(Config::default_path))?;
    if let Some(database) = cli.database {
        config.database_path = Some(database);
    }
    if let Some(base_url) = cli.base_url {
        config.share_base_url = base_url;
    }

    match cli.command {
        Commands::Compose {
            input,
            output,
            edit,
        } => {
            let session = edit_session(&config, &std::fs::read(&input)?, &edit, sub_matches)?;
            std::fs::write(&output, session.render()?)?;
            println!("Wrote {}", output.display());
        }
        Commands::Capture {
            camera,
            output,
            edit,
        } => {
            let frame = capture(&config, &camera).await?;
            let session = edit_session(&config, &frame, &edit, sub_matches)?;
            std::fs::write(&output, session.render()?)?;
            println!("Wrote {}", output.display());
        }
        Commands::Save {
            input,
            owner,
            token,
            edit,
        } => {
            let session = edit_session(&config, &std::fs::read(&input)?, &edit, sub_matches)?;
            let mut request = session.finish(&owner)?;
            request.share_token = token;

            let service = open_service(&config)?;
            let record = service.create(request)?;
            println!("Saved photo {}", record.id);
            println!(
                "Share link: {}",
                share_url(&config.share_base_url, &record.share_token)
            );
        }
        Commands::Get { id } => {
            let record = open_service(&config)?.get(&id)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Share { token } => {
            let photo = open_service(&config)?.resolve(&token)?;
            println!("{}", serde_json::to_string_pretty(&photo)?);
        }
        Commands::Link { token, qr } => {
            let link = open_service(&config)?.share_link(&token)?;
            println!("{}", link.url);
            if let Some(path) = qr {
                std::fs::write(&path, &link.qr_png)?;
                println!("QR code written to {}", path.display());
            }
        }
        Commands::Delete { id, owner } => {
            let deleted = open_service(&config)?.delete(&id, &owner)?;
            println!("Deleted photo {}", deleted.id);
        }
        Commands::List {
            owner,
            limit,
            offset,
        } => {
            let records = open_service(&config)?.list(owner.as_deref(), limit, offset)?;
            for record in records {
                println!(
                    "{}\t{}\t{}\t{}",
                    record.id,
                    record.owner_id,
                    record.share_token,
                    record.created_at.to_rfc3339()
                );
            }
        }
    }

    Ok(())
}

fn open_service(config: &Config) -> photobooth::Result<PhotoService<Library>> {
    let library = Library::open(config.database_path())?;
    Ok(PhotoService::with_config(library, config.share()))
}

fn edit_session(
    config: &Config,
    base: &[u8],
    edit: &EditArgs,
    matches: Option<&ArgMatches>,
) -> photobooth::Result<EditSession> {
    let mut session = EditSession::new(base, Compositor::new(config.overlay_font_size))?;
    session.set_brightness(edit.brightness)?;
    session.set_contrast(edit.contrast)?;
    if edit.grayscale {
        session.toggle_grayscale();
    }
    if edit.sepia {
        session.toggle_sepia();
    }
    for overlay in overlay_order(edit, matches) {
        match overlay {
            OverlayArg::Sticker(p) => session.add_sticker(&p.value, p.position)?,
            OverlayArg::Text(p) => session.add_text(&p.value, p.position)?,
        };
    }
    Ok(session)
}

async fn capture(config: &Config, camera: &Path) -> photobooth::Result<Vec<u8>> {
    let mut session = CaptureSession::new(StillCamera::new(camera))
        .with_countdown(config.countdown_ticks, config.countdown_interval());
    session.start().await?;

    match session.countdown(|n| println!("{}...", n)).await? {
        CountdownOutcome::Captured => session.take_capture().ok_or_else(|| {
            photobooth::PhotoboothError::DeviceAccess("no frame was captured".to_string())
        }),
        CountdownOutcome::Cancelled => Err(photobooth::PhotoboothError::DeviceAccess(
            "capture cancelled".to_string(),
        )),
    }
}
