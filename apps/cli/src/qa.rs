use std::{sync::Arc, time::Instant};

use anyhow::{Context, Result};
use console::style;
use storyline_core::{
    GeminiClient, GeminiConfig, Level, QaGenerator, format_qa_readable, get_qa_path, load_report,
    save_qa_results,
};
use tokio::fs;

use crate::{QaArgs, create_spinner, format_duration};

pub async fn run(args: QaArgs) -> Result<()> {
    let gemini = GeminiConfig::from_env(&args.model)?;

    let report = load_report(&args.analysis)
        .await
        .with_context(|| format!("Failed to read {}", args.analysis.display()))?;

    let levels: Vec<Level> = args
        .levels
        .iter()
        .filter_map(|&n| Level::from_number(n))
        .collect();

    let mut generator = QaGenerator::new(Arc::new(GeminiClient::new(gemini)?));
    if let Some(tasks) = &args.tasks {
        let definitions = fs::read_to_string(tasks)
            .await
            .with_context(|| format!("Failed to read {}", tasks.display()))?;
        generator = generator.with_task_definitions(definitions);
    }

    println!("{}", style("─".repeat(60)).dim());

    let step_start = Instant::now();
    let spinner = create_spinner(&format!(
        "Generating QA pairs for {} level(s)...",
        levels.len()
    ));
    let results = generator.process_report(&report, &levels).await;
    let pairs: usize = results.iter().map(|r| r.qa_pairs.len()).sum();
    spinner.finish_with_message(format!(
        "{} Generated {} QA pairs {}",
        style("✓").green().bold(),
        pairs,
        style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
    ));

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| get_qa_path(&args.analysis));
    save_qa_results(&results, &output).await?;

    println!(
        "\n{} {}\n",
        style("Saved:").dim(),
        style(output.display()).cyan()
    );
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", format_qa_readable(&results));

    Ok(())
}
