use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use sha2::Digest as _;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "memeforge", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a meme request to a PNG.
    Render(RenderArgs),
    /// List the supported filter functions.
    Filters,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input render request JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Local image file that replaces the request's image source.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Caption font file. Defaults to an installed system font.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Print caption font diagnostics (family + sha256) to stderr.
    #[arg(long, default_value_t = false)]
    dump_font: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args).await,
        Command::Filters => {
            cmd_filters();
            Ok(())
        }
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}

async fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let json = tokio::fs::read_to_string(&args.in_path)
        .await
        .with_context(|| format!("read request '{}'", args.in_path.display()))?;
    let mut request: memeforge::RenderRequest = serde_json::from_str(&json)
        .with_context(|| format!("parse request '{}'", args.in_path.display()))?;

    if let Some(path) = &args.image {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("read image '{}'", path.display()))?;
        request.image_source = memeforge::ImageSource::bytes(bytes);
    }

    let needs_font = [&request.top_band, &request.bottom_band]
        .into_iter()
        .flatten()
        .any(|b| !b.is_empty());

    let mut compositor = memeforge::Compositor::new(memeforge::CompositorOpts::from_env())?;
    if needs_font || args.font.is_some() || args.dump_font {
        let font = match &args.font {
            Some(path) => memeforge::FontFace::from_path(path)?,
            None => memeforge::FontFace::system_default()
                .context("no caption font found; pass --font")?,
        };
        if args.dump_font {
            dump_font_diagnostics(&font, args.font.as_ref());
        }
        compositor = compositor.with_font(font);
    }

    let frame = compositor
        .render(&request)
        .await
        .with_context(|| format!("render '{}'", args.in_path.display()))?;
    let rgba = frame.to_rgba_image()?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        rgba.as_raw(),
        frame.width(),
        frame.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    tracing::info!(
        width = frame.width(),
        height = frame.height(),
        out = %args.out.display(),
        "rendered meme"
    );
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_filters() {
    for (name, default_arg) in memeforge::FILTER_FUNCTIONS {
        println!("{name}({default_arg})");
    }
}

fn dump_font_diagnostics(font: &memeforge::FontFace, source: Option<&PathBuf>) {
    eprintln!("caption font diagnostics:");
    match source {
        Some(p) => eprintln!("  source: {}", p.display()),
        None => eprintln!("  source: system"),
    }
    eprintln!("  family: {}", font.family());
    eprintln!("  bytes:  {}", font.bytes().len());
    eprintln!("  sha256: {}", sha256_hex(font.bytes()));
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
