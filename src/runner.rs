//! Command-line run: load inputs, calculate, emit JSON

use crate::Cli;
use anyhow::{Context, Result};
use flagscope_core::FlagCatalog;
use flagscope_cv::{
    CalculationConfig, CalculationPipeline, CalculationReport, PredictionLoader, StaticInference,
};
use flagscope_cv::traits::InferenceClient;
use log::info;
use std::fs;

pub fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => CalculationConfig::from_json_file(path)?,
        None => CalculationConfig::default(),
    };

    let loaded_catalog;
    let catalog = match &cli.catalog {
        Some(path) => {
            loaded_catalog = FlagCatalog::load(path)?;
            &loaded_catalog
        }
        None => FlagCatalog::builtin(),
    };
    info!("Using catalog with {} flag classes", catalog.len());

    let client: Box<dyn InferenceClient> = match &cli.predictions {
        Some(path) => Box::new(PredictionLoader::new(path)),
        None => Box::new(StaticInference::empty()),
    };

    let pipeline = CalculationPipeline::new(config, catalog);

    let mut images = Vec::with_capacity(cli.images.len());
    for path in &cli.images {
        let bytes = fs::read(path).with_context(|| format!("Failed to read image: {:?}", path))?;
        images.push(bytes);
    }

    let mut reports: Vec<CalculationReport> = Vec::with_capacity(images.len());
    for (path, result) in cli.images.iter().zip(pipeline.process_batch(&images, client.as_ref())) {
        let report = result.with_context(|| format!("Failed to process image: {:?}", path))?;
        info!("{:?}: {} ({})", path, report.predicted_class, report.final_confidence.confidence_pct);
        reports.push(report);
    }

    let json = match (reports.len(), cli.compact) {
        (1, true) => serde_json::to_string(&reports[0])?,
        (1, false) => serde_json::to_string_pretty(&reports[0])?,
        (_, true) => serde_json::to_string(&reports)?,
        (_, false) => serde_json::to_string_pretty(&reports)?,
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write report: {:?}", path))?;
            info!("Report written to {:?}", path);
        }
        None => println!("{}", json),
    }

    Ok(())
}
