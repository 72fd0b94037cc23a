//! audioconv - Audio Format Converter

use clap::Parser;
use std::path::PathBuf;
use std::process;
use audioconv::config::utils::format_from_path;
use audioconv::processing::BatchConverter;
use audioconv::{init_logging, Args, AudioError, Config, Pipeline, Result};

fn main() {
    let args = Args::parse();

    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    if args.verbose {
        println!("{}", audioconv::get_library_info());
        println!();
    }

    let pipeline = Pipeline::with_builtin();

    if args.list_formats {
        for format in pipeline.registry().supported_formats() {
            println!("{}", format);
        }
        return Ok(());
    }

    if let Some(path) = &args.write_config {
        Config::create_default_config(path)?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    if args.inputs.is_empty() {
        return Err(AudioError::config("No input files given"));
    }

    let config = Config::from_args_and_config(&args)?;
    let target_format = resolve_target_format(&args);

    if args.inputs.len() == 1 && args.output_dir.is_none() {
        let input = &args.inputs[0];
        let output = args
            .output
            .clone()
            .unwrap_or_else(|| input.with_extension(&target_format));
        if &output == input {
            return Err(AudioError::config(format!(
                "Output would overwrite input: {}",
                input.display()
            )));
        }

        let summary = pipeline.convert_file(input, &output, &target_format, config.options())?;

        println!("=== Conversion Complete ===");
        println!("{} -> {}", summary.input_path.display(), summary.output_path.display());
        println!("Size: {} -> {} bytes", summary.input_bytes, summary.output_bytes);
        if config.verbose() {
            println!("Duration: {:.2}s", summary.duration_secs);
            println!("Time: {:.3}s (RTF {:.4})", summary.elapsed.as_secs_f64(), summary.real_time_factor());
        }
        return Ok(());
    }

    if args.output.is_some() {
        return Err(AudioError::config("--output takes a single input; use --output-dir"));
    }
    let output_dir = args.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));

    println!("Mode: Batch ({} workers)", config.jobs());
    let batch = BatchConverter::new(pipeline, config.jobs())?;
    let report = batch.convert_all(&args.inputs, &output_dir, &target_format, config.options());

    for item in &report.items {
        match &item.result {
            Ok(s) => println!("ok    {} -> {} ({} bytes)", item.input.display(), item.output.display(), s.output_bytes),
            Err(e) => println!("FAIL  {}: {}", item.input.display(), e),
        }
    }
    println!("=== Batch Complete: {} ok, {} failed, {:.2}s ===",
        report.succeeded(), report.failed(), report.processing_time_secs);

    if report.failed() > 0 {
        return Err(AudioError::convert(format!("{} conversions failed", report.failed())));
    }
    Ok(())
}

/// `--format`, else the `--output` extension, else wav
fn resolve_target_format(args: &Args) -> String {
    args.format
        .as_deref()
        .map(|f| f.trim_start_matches('.').to_ascii_lowercase())
        .or_else(|| args.output.as_deref().and_then(format_from_path))
        .unwrap_or_else(|| "wav".to_string())
}

