//! Parallel batch conversion - one rayon task per file

use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{info, warn};
use rayon::prelude::*;

use crate::config::ConvertOptions;
use crate::error::{AudioError, Result};
use crate::pipeline::{ConversionSummary, Pipeline};

/// Result of one file in a batch
#[derive(Debug)]
pub struct BatchItem {
    pub input: PathBuf,
    pub output: PathBuf,
    pub result: Result<ConversionSummary>,
}

#[derive(Debug)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
    pub processing_time_secs: f64,
    pub worker_count: usize,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }
}

pub struct BatchConverter {
    pipeline: Pipeline,
    pool: rayon::ThreadPool,
    workers: usize,
}

impl BatchConverter {
    pub fn new(pipeline: Pipeline, num_workers: usize) -> Result<Self> {
        let workers = num_workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("audioconv-{}", i))
            .build()
            .map_err(|e| AudioError::config(format!("Failed to build worker pool: {}", e)))?;

        Ok(Self {
            pipeline,
            pool,
            workers,
        })
    }

    /// Output path for `input` inside `output_dir`: the input's last
    /// extension is replaced by `format`, earlier dots in the stem are kept.
    pub fn output_path(input: &Path, output_dir: &Path, format: &str) -> PathBuf {
        let mut name = input.file_stem().unwrap_or(input.as_os_str()).to_os_string();
        name.push(".");
        name.push(format.to_ascii_lowercase());
        output_dir.join(name)
    }

    /// Convert every input into `output_dir`. A failed file does not stop the others.
    pub fn convert_all(
        &self,
        inputs: &[PathBuf],
        output_dir: &Path,
        target_format: &str,
        options: &ConvertOptions,
    ) -> BatchReport {
        let start = Instant::now();

        let items: Vec<BatchItem> = self.pool.install(|| {
            inputs
                .par_iter()
                .map(|input| {
                    let output = Self::output_path(input, output_dir, target_format);
                    let result = self.pipeline.convert_file(input, &output, target_format, options);
                    if let Err(e) = &result {
                        warn!("{}: {}", input.display(), e);
                    }
                    BatchItem {
                        input: input.clone(),
                        output,
                        result,
                    }
                })
                .collect()
        });

        let report = BatchReport {
            items,
            processing_time_secs: start.elapsed().as_secs_f64(),
            worker_count: self.workers,
        };
        info!(
            "Batch complete: {} ok, {} failed in {:.2}s",
            report.succeeded(),
            report.failed(),
            report.processing_time_secs
        );
        report
    }
}
