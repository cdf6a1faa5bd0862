//! Remove a bottom-right watermark from a single image.
//!
//! Usage:
//! ```sh
//! cargo run --example remove_watermark -- input.jpg output.png
//! ```

use std::env;
use std::process;

use corner_watermark_removal::{ProcessOptions, WatermarkEngine};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <input> <output>", args[0]);
        process::exit(1);
    }

    let input = &args[1];
    let output = &args[2];

    let engine = WatermarkEngine::new();
    let opts = ProcessOptions::default();
    let result = engine.process_file(input.as_ref(), output.as_ref(), &opts);

    if result.skipped {
        println!("Skipped: {}", result.message);
    } else if result.success {
        println!("Done: {}", result.message);
    } else {
        eprintln!("Error: {}", result.message);
        process::exit(1);
    }
}
