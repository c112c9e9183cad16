//! Photo Resize
//!
//! Prepares photos for the ESP32-2432S028 photo frame. The frame draws JPEGs
//! 1:1 from the top-left corner, so anything larger than the panel is cut
//! off. This tool letterboxes each photo onto a 320×240 black canvas.
//!
//! # Usage
//!
//! ```bash
//! # Prompt for a folder, write <folder>/converted_photos/
//! photo-resize
//!
//! # Same, non-interactive
//! photo-resize ~/Pictures/frame
//!
//! # Custom canvas and quality
//! photo-resize resize ~/Pictures/frame --width 320 --height 240 --quality 90
//!
//! # Check the converted photos against the on-device decoder
//! photo-resize verify ~/Pictures/frame/converted_photos --preview /tmp/preview
//! ```

mod resize;
mod scan;
mod verify;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use log::{debug, info};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use cyd_slideshow::config::{PANEL_HEIGHT, PANEL_WIDTH};
use resize::{ResizeOptions, DEFAULT_OUTPUT_NAME, DEFAULT_QUALITY};
use verify::PanelPreview;

/// Photo Resize
///
/// Letterbox photos for the CYD photo frame
#[derive(Parser)]
#[command(name = "photo-resize")]
#[command(author = "Prasanna Gautam")]
#[command(version = "0.1.0")]
#[command(about = "Letterbox JPEG photos to the 320x240 photo frame panel")]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    resize: ResizeArgs,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Letterbox every JPEG in a folder (the default)
    Resize(ResizeArgs),

    /// Decode JPEGs with the frame's decoder and report what it would show
    Verify {
        /// Folder containing JPEG images
        dir: PathBuf,

        /// Write a PNG of the panel for each image into this folder
        #[arg(short, long)]
        preview: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ResizeArgs {
    /// Folder containing JPEG images (prompted for when omitted)
    dir: Option<PathBuf>,

    /// Canvas width in pixels
    #[arg(long, default_value_t = PANEL_WIDTH)]
    width: u32,

    /// Canvas height in pixels
    #[arg(long, default_value_t = PANEL_HEIGHT)]
    height: u32,

    /// JPEG quality (1-100)
    #[arg(short, long, default_value_t = DEFAULT_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Output folder name, created inside the input folder
    #[arg(short, long, default_value = DEFAULT_OUTPUT_NAME)]
    output_name: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    match cli.command {
        Some(Commands::Resize(args)) => handle_resize(args),
        Some(Commands::Verify { dir, preview }) => handle_verify(&dir, preview.as_deref()),
        None => handle_resize(cli.resize),
    }
}

fn handle_resize(args: ResizeArgs) -> Result<()> {
    println!("{}", "=".repeat(60));
    println!(
        "{}",
        format!(
            "JPEG Image Resizer - {}x{} with Black Padding",
            args.width, args.height
        )
        .cyan()
        .bold()
    );
    println!("{}", "=".repeat(60));

    let input_dir = match args.dir {
        Some(dir) => dir,
        None => prompt_for_dir()?,
    };
    check_input_dir(&input_dir);

    println!("\nProcessing images in: {}", input_dir.display());

    let output_dir = resize::prepare_output_dir(&input_dir, &args.output_name)?;
    let images = scan::find_jpegs(&input_dir)?;
    if images.is_empty() {
        println!(
            "{} No JPEG images found in {}",
            "[!]".yellow().bold(),
            input_dir.display()
        );
        return Ok(());
    }

    println!("Found {} images. Processing...\n", images.len());

    let opts = ResizeOptions {
        width: args.width,
        height: args.height,
        quality: args.quality,
    };
    info!(
        "target {}x{} quality {} -> {}",
        opts.width,
        opts.height,
        opts.quality,
        output_dir.display()
    );

    let mut failed = 0usize;
    for input in &images {
        let name = file_name(input);
        let output = output_dir.join(&name);
        debug!("{} -> {}", input.display(), output.display());

        match resize::resize_file(input, &output, &opts) {
            Ok(()) => println!("{} Processed: {}", "✓".green().bold(), name),
            Err(e) => {
                failed += 1;
                println!("{} Error processing {}: {}", "✗".red().bold(), name, e);
            }
        }
    }

    println!(
        "\n{} Done! Resized images saved to: {}",
        "✓".green().bold(),
        output_dir.display()
    );
    if failed > 0 {
        println!(
            "{} {} of {} images could not be converted",
            "[!]".yellow().bold(),
            failed,
            images.len()
        );
    }

    Ok(())
}

fn handle_verify(dir: &Path, preview: Option<&Path>) -> Result<()> {
    check_input_dir(dir);

    if let Some(out) = preview {
        fs::create_dir_all(out)
            .with_context(|| format!("Failed to create {}", out.display()))?;
    }

    let images = scan::find_jpegs(dir)?;

    println!("{}", "=".repeat(60));
    println!("{}", "Decoder Check".cyan().bold());
    println!("{}", "=".repeat(60));
    println!("Folder: {}", dir.display());
    println!("Images: {}\n", images.len());

    let mut panel = PanelPreview::new();
    let mut ok = 0usize;

    for path in &images {
        let name = file_name(path);
        let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

        match panel.render(&data) {
            Ok(img) => {
                ok += 1;
                println!(
                    "  {} {} ({}x{}, {} component{})",
                    "[OK]".green().bold(),
                    name,
                    img.width,
                    img.height,
                    img.components,
                    if img.components == 1 { "" } else { "s" }
                );
                if !verify::fits_panel(&img) {
                    println!(
                        "       {} larger than {}x{}, right side is cut off",
                        "[!]".yellow().bold(),
                        PANEL_WIDTH,
                        PANEL_HEIGHT
                    );
                }
            }
            Err(e) => {
                println!(
                    "  {} {} (code {}): {}",
                    "[ERROR]".red().bold(),
                    name,
                    e.code(),
                    e
                );
                if let Ok(img) = panel.inspect(&data) {
                    println!(
                        "       {}x{}, panel is {}x{}",
                        img.width, img.height, PANEL_WIDTH, PANEL_HEIGHT
                    );
                }
            }
        }

        if let Some(out) = preview {
            let png = out.join(Path::new(&name).with_extension("png"));
            panel.save_png(&png)?;
            debug!("preview written to {}", png.display());
        }
    }

    println!("\n{}", "=".repeat(60));
    let summary = format!("{} of {} images decode cleanly", ok, images.len());
    if ok == images.len() {
        println!("{}", summary.green().bold());
    } else {
        println!("{}", summary.yellow().bold());
    }

    Ok(())
}

fn prompt_for_dir() -> Result<PathBuf> {
    print!("\nEnter the folder path containing JPEG images: ");
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read folder path")?;

    Ok(PathBuf::from(strip_quotes(&line)))
}

/// Trim whitespace, then any quotes a file manager added when pasting.
fn strip_quotes(raw: &str) -> &str {
    raw.trim().trim_matches('"').trim_matches('\'')
}

/// Exit with status 1 unless `dir` is an existing directory.
fn check_input_dir(dir: &Path) {
    if !dir.exists() {
        eprintln!(
            "\n{} Directory '{}' does not exist!",
            "✗ Error:".red().bold(),
            dir.display()
        );
        std::process::exit(1);
    }

    if !dir.is_dir() {
        eprintln!(
            "\n{} '{}' is not a directory!",
            "✗ Error:".red().bold(),
            dir.display()
        );
        std::process::exit(1);
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
