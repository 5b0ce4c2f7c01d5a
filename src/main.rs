use std::fs;

use clap::Parser;
use despacho::config::{CliConfig, PendingPolicy, RunConfig};
use despacho::core::LabelPipeline;
use despacho::domain::model::Decision;
use despacho::domain::ports::OutputSink;
use despacho::output::{CarrierSerializer, CsvSink};
use despacho::resolve::ExceptionTable;
use despacho::utils::{logger, validation::Validate};
use despacho::FileCatalogSource;

fn main() {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting despacho");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    if let Err(e) = run(&config) {
        tracing::error!("Run failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }
}

fn run(config: &CliConfig) -> despacho::Result<()> {
    let run_config = match &config.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };

    let source = FileCatalogSource::new(&config.postal_file, &config.branch_file);
    let pipeline = LabelPipeline::from_source(
        &source,
        run_config.weights.clone(),
        ExceptionTable::from_entries(run_config.exceptions.clone()),
        run_config.package.clone(),
    )?;

    // Exports are occasionally mis-encoded; lossy decoding feeds the
    // replacement characters into the normalizer's repair pass.
    let bytes = fs::read(&config.input)?;
    let text = String::from_utf8_lossy(&bytes);

    let mut state = pipeline.run(&text)?;

    let pending = state.review.list_pending().len();
    if pending > 0 {
        for suggestion in state.review.list_pending() {
            tracing::warn!(
                order_id = %suggestion.order_id,
                branch = %suggestion.branch.name,
                score = suggestion.score,
                reason = %suggestion.reason,
                "pending suggestion"
            );
        }
        match config.pending {
            PendingPolicy::AcceptAll => state.review.decide_all(Decision::Accepted)?,
            PendingPolicy::RejectAll => state.review.decide_all(Decision::Rejected)?,
            PendingPolicy::Fail => {}
        }
    }

    let output = state.finish()?;

    let sink = CsvSink::new(&config.output_dir);
    sink.write(&CarrierSerializer::layout("home"), &output.home)?;
    sink.write(&CarrierSerializer::layout("pickup"), &output.pickup)?;

    fs::create_dir_all(&config.output_dir)?;
    let report_path = config.output_dir.join("report.json");
    fs::write(&report_path, serde_json::to_vec_pretty(&output.report)?)?;

    tracing::info!("✅ Run completed");
    println!("✅ Run completed");
    println!(
        "📦 {} home delivery, {} pickup, {} dropped (of {} ingested)",
        output.home.len(),
        output.pickup.len(),
        output.report.dropped,
        output.report.total_ingested
    );
    if !output.report.manual_processing.is_empty() {
        println!(
            "✋ requires manual processing: {}",
            output.report.manual_processing.join(", ")
        );
    }
    println!("📁 Output saved to: {}", config.output_dir.display());

    Ok(())
}
