use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use corner_watermark_removal::{
    default_output_path, ProcessOptions, ProcessResult, Thresholds, WatermarkEngine,
};

#[derive(Parser)]
#[command(
    name = "corner-watermark",
    about = "Remove near-white bottom-right watermarks via diffusion inpainting",
    version,
    after_help = "Simple usage: corner-watermark <image>  (detect and write {name}_cleaned.png)\n\n\
                  NOTE: This tool targets light opaque stamps in the bottom-right corner.\n\
                  Watermarks elsewhere in the frame are not touched."
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Output file or directory (default: {name}_cleaned.png)
    #[arg(short, long)]
    output: Option<String>,

    /// Inpaint the candidate mask even when the detection gate rejects it
    #[arg(short, long)]
    force: bool,

    /// Maximum image dimension; larger inputs are downscaled
    #[arg(long, default_value = "2048")]
    max_dimension: u32,

    /// Scan region side as a fraction of the smaller image dimension
    #[arg(long, default_value = "0.18")]
    roi_fraction: f32,

    /// Color channel floor for the near-white test (0-255, exclusive)
    #[arg(long, default_value = "235")]
    white_floor: u8,

    /// Alpha floor for the opacity test (0-255, exclusive)
    #[arg(long, default_value = "200")]
    alpha_floor: u8,

    /// Mask dilation iterations
    #[arg(long, default_value = "2")]
    dilation: u32,

    /// Minimum masked pixel count for detection (exclusive)
    #[arg(long, default_value = "80")]
    min_count: usize,

    /// Maximum masked share of the scan region for detection (exclusive)
    #[arg(long, default_value = "0.25")]
    max_ratio: f32,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if !(0.0..=1.0).contains(&cli.roi_fraction) || cli.roi_fraction == 0.0 {
        eprintln!("Error: --roi-fraction must be in (0.0, 1.0]");
        process::exit(1);
    }

    if !(0.0..=1.0).contains(&cli.max_ratio) {
        eprintln!("Error: --max-ratio must be between 0.0 and 1.0");
        process::exit(1);
    }

    let thresholds = Thresholds {
        max_dimension: cli.max_dimension,
        roi_fraction: cli.roi_fraction,
        white_floor: cli.white_floor,
        alpha_floor: cli.alpha_floor,
        dilation_iterations: cli.dilation,
        min_masked_count: cli.min_count,
        max_area_ratio: cli.max_ratio,
        ..Thresholds::default()
    };

    let opts = ProcessOptions {
        force: cli.force,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let engine = WatermarkEngine::with_thresholds(thresholds);

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    if !opts.quiet && opts.force {
        eprintln!("WARNING: Force mode - inpainting every candidate mask without gating!");
        eprintln!();
    }

    let results = if input_path.is_dir() {
        let output_dir = if let Some(o) = &cli.output {
            PathBuf::from(o)
        } else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: corner-watermark <input_dir> -o <output_dir>");
            process::exit(1);
        };
        engine.process_directory(input_path, &output_dir, &opts)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path),
        };
        vec![engine.process_file(input_path, &output_path, &opts)]
    };

    let mut success_count = 0u32;
    let mut skip_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &opts);
        if r.skipped {
            skip_count += 1;
        } else if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if skip_count > 0 {
            eprint!(", Skipped: {skip_count}");
        }
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    if opts.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.skipped {
        if !opts.quiet {
            eprintln!("[SKIP] {filename}: {}", result.message);
        }
    } else if result.success {
        if !opts.quiet {
            if result.masked_pixels > 0 {
                eprintln!("[OK] {filename} ({} masked pixels)", result.masked_pixels);
            } else {
                eprintln!("[OK] {filename}");
            }
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if opts.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
