use clap::{Parser, Subcommand};
use robeautify::editor::EditorSession;
use robeautify::geometry::{CropRect, RotateDirection};
use robeautify::output;
use robeautify::state::{AspectRatio, Filter, Slider};
use robeautify::store::{DiscardStore, JsonSessionStore, SessionStore};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "robeautify")]
#[command(about = "Headless photo editor: filters, adjustments, crop and rotate")]
#[command(long_about = "\
Headless photo editor: filters, adjustments, crop and rotate

Loads a JPEG/PNG/WebP image (up to 5MB, downscaled to fit 1200x800),
applies the requested edits in pipeline order — filters first, then tonal
adjustments, then rotations and crop — and exports the result as JPEG.

Examples:

  robeautify filters
  robeautify apply -i photo.jpg -o out.jpg --filter sepia --exposure 20
  robeautify apply -i photo.jpg -o out.jpg --rotate left --crop 40,30,640,480
  robeautify apply -i photo.jpg -o out.jpg --session-dir .robeautify-session
  robeautify resume --session-dir .robeautify-session -o out.jpg

Filters marked (randomized) vary between runs unless --seed is given.")]
#[command(version = version_string())]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// 90° rotation step, repeatable on the command line.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum RotateArg {
    Left,
    Right,
}

impl From<RotateArg> for RotateDirection {
    fn from(arg: RotateArg) -> Self {
        match arg {
            RotateArg::Left => RotateDirection::Left,
            RotateArg::Right => RotateDirection::Right,
        }
    }
}

#[derive(clap::Args)]
struct ApplyArgs {
    /// Source image (JPEG, PNG, or WebP, up to 5MB)
    #[arg(short, long)]
    input: PathBuf,

    /// Output JPEG path
    #[arg(short, long)]
    output: PathBuf,

    /// Enable a filter by name (repeatable; see `robeautify filters`)
    #[arg(long = "filter")]
    filters: Vec<String>,

    /// Exposure slider, -100..=100
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    exposure: i32,

    /// Contrast slider, -100..=100
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    contrast: i32,

    /// Saturation slider, -100..=100
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    saturation: i32,

    /// Temperature slider, -100..=100 (positive warms, negative cools)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    temperature: i32,

    /// Rotate 90° left/right (repeatable, applied in order)
    #[arg(long = "rotate", value_enum)]
    rotations: Vec<RotateArg>,

    /// Crop rectangle as x,y,width,height in image pixels (min 50x50),
    /// applied after rotations
    #[arg(long)]
    crop: Option<String>,

    /// Aspect-ratio constraint for --crop: custom, original, 1:1, 3:4,
    /// 4:3, 9:16, or 16:9
    #[arg(long, default_value = "custom")]
    ratio: String,

    /// Seed for the randomized filters (noise, lofi, robeautify)
    #[arg(long)]
    seed: Option<u32>,

    /// Persist the session here so it can be resumed later
    #[arg(long)]
    session_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Load an image, apply edits, export the result
    Apply(ApplyArgs),
    /// List the available filters
    Filters,
    /// Load an image and report how the editor sees it
    Info {
        /// Source image
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Re-render a persisted session and export it
    Resume {
        /// Directory a previous `apply --session-dir` wrote to
        #[arg(long)]
        session_dir: PathBuf,

        /// Output JPEG path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Delete a persisted session
    Clear {
        /// Session directory to wipe
        #[arg(long)]
        session_dir: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Apply(args) => match args.session_dir.clone() {
            Some(dir) => run_apply(EditorSession::new(JsonSessionStore::new(dir)), &args),
            None => run_apply(EditorSession::new(DiscardStore), &args),
        },
        Command::Filters => {
            output::print_filter_list();
            Ok(())
        }
        Command::Info { input } => {
            let bytes = std::fs::read(&input)?;
            let mut session = EditorSession::new(DiscardStore);
            session.load_image(&bytes)?;
            output::print_session(
                session.state(),
                session.dimensions(),
                session.history_position(),
            );
            Ok(())
        }
        Command::Resume {
            session_dir,
            output: output_path,
        } => {
            let session = EditorSession::resume(JsonSessionStore::new(session_dir));
            if !session.is_loaded() {
                return Err("no resumable session found (or it was unreadable)".into());
            }
            let jpeg = session.export_current_image()?;
            std::fs::write(&output_path, &jpeg)?;
            output::print_session(
                session.state(),
                session.dimensions(),
                session.history_position(),
            );
            println!("Exported {}", output_path.display());
            Ok(())
        }
        Command::Clear { session_dir } => {
            JsonSessionStore::new(session_dir).clear()?;
            println!("Session cleared");
            Ok(())
        }
    }
}

fn run_apply<S: SessionStore>(
    mut session: EditorSession<S>,
    args: &ApplyArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(&args.input)?;
    if let Some(seed) = args.seed {
        session.set_noise_seed(seed);
    }
    session.load_image(&bytes)?;

    for name in &args.filters {
        let filter = Filter::from_name(name)
            .ok_or_else(|| format!("unknown filter '{name}' (see `robeautify filters`)"))?;
        session.toggle_filter(filter)?;
    }

    for (slider, value) in [
        (Slider::Exposure, args.exposure),
        (Slider::Contrast, args.contrast),
        (Slider::Saturation, args.saturation),
        (Slider::Temperature, args.temperature),
    ] {
        if value != 0 {
            session.set_adjustment(slider, value)?;
        }
    }

    for rotation in &args.rotations {
        session.rotate((*rotation).into())?;
    }

    if let Some(spec) = &args.crop {
        let ratio = AspectRatio::from_name(&args.ratio)
            .ok_or_else(|| format!("unknown aspect ratio '{}'", args.ratio))?;
        session.set_aspect_ratio(ratio)?;
        session.set_crop_rect(parse_crop_spec(spec)?);
        if !session.commit_crop()? {
            return Err("crop rectangle is below the 50px minimum".into());
        }
    }

    let jpeg = session.export_current_image()?;
    std::fs::write(&args.output, &jpeg)?;

    output::print_session(
        session.state(),
        session.dimensions(),
        session.history_position(),
    );
    println!("Exported {}", args.output.display());
    Ok(())
}

/// Parse `x,y,width,height` into a crop rectangle.
fn parse_crop_spec(spec: &str) -> Result<CropRect, String> {
    let parts: Vec<&str> = spec.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(format!("expected x,y,width,height, got '{spec}'"));
    }
    let mut values = [0.0f64; 4];
    for (slot, part) in values.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("'{part}' is not a number in crop spec '{spec}'"))?;
    }
    Ok(CropRect::new(values[0], values[1], values[2], values[3]))
}
