use std::{sync::Arc, time::Instant};

use anyhow::{Result, bail};
use console::style;
use storyline_core::{
    DurationResolver, EngineConfig, FixedDuration, GeminiClient, GeminiConfig, GenerationOptions,
    HierarchicalDescriptionEngine, MediaSource, format_report_readable, format_timestamp,
    get_analysis_path, get_cache_dir, load_report, save_report,
};

use crate::{DescribeArgs, create_spinner, format_duration};

pub async fn run(args: DescribeArgs) -> Result<()> {
    // Validate API key early
    let gemini = GeminiConfig::from_env(&args.model)?;
    let model = gemini.model.clone();

    let config = EngineConfig {
        level1_interval: args.level1_interval,
        level2_interval: args.level2_interval,
        options: GenerationOptions {
            max_output_tokens: args.max_output_tokens,
            temperature: args.temperature,
        },
        style: args.style.into(),
    };
    config.validate()?;

    let source = MediaSource::parse(&args.media);
    if let MediaSource::Local(path) = &source
        && !path.is_file()
    {
        bail!("{} is not a file", path.display());
    }

    let cache_dir = get_cache_dir(&source.cache_key());
    let analysis_path = get_analysis_path(
        &cache_dir,
        &model,
        config.level1_interval,
        config.level2_interval,
    );

    println!("{}", style("─".repeat(60)).dim());
    let total_start = Instant::now();

    let report = if !args.force && analysis_path.exists() {
        tracing::info!(path = %analysis_path.display(), "Using cached analysis");
        let report = load_report(&analysis_path).await?;
        println!(
            "{} Described {} {}",
            style("✓").green().bold(),
            format_timestamp(report.duration),
            style("(cached)").dim()
        );
        report
    } else {
        let client = Arc::new(GeminiClient::new(gemini)?);

        tracing::info!(%source, model = %model, "Describing video");
        let media_ref = match &source {
            MediaSource::Local(path) => {
                let step_start = Instant::now();
                let spinner = create_spinner("Uploading video...");
                let uri = client.upload_file(path).await?;
                spinner.finish_with_message(format!(
                    "{} Uploaded: {} {}",
                    style("✓").green().bold(),
                    style(&uri).dim(),
                    style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
                ));
                uri
            }
            MediaSource::Remote(url) => url.clone(),
        };

        let mut resolver = DurationResolver::default();
        if let Some(seconds) = args.duration {
            resolver = resolver.prepend(Box::new(FixedDuration(seconds)));
        }
        let spinner = create_spinner("Checking duration...");
        let duration = resolver.resolve(&source).await;
        spinner.finish_with_message(format!(
            "{} Duration: {}",
            style("✓").green().bold(),
            format_timestamp(duration)
        ));

        let step_start = Instant::now();
        let spinner = create_spinner("Describing video...");
        let progress = spinner.clone();
        let mut engine = HierarchicalDescriptionEngine::new(client, config)?.on_description(
            move |description| {
                progress.set_message(format!(
                    "Describing video... {} at {} / {}",
                    description.level,
                    format_timestamp(description.timestamp),
                    format_timestamp(duration)
                ));
            },
        );

        let mut report = match engine.process(&media_ref, duration).await {
            Ok(report) => report,
            Err(e) => {
                spinner.finish_and_clear();
                return Err(e.into());
            }
        };
        report.model = Some(model.clone());
        if media_ref != args.media {
            report.source = Some(args.media.clone());
        }

        save_report(&report, &analysis_path).await?;
        spinner.finish_with_message(format!(
            "{} Described: {} segments, {} plot summaries ({}) {}",
            style("✓").green().bold(),
            report.level1_descriptions.len(),
            report.level2_descriptions.len(),
            model,
            style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
        ));
        report
    };

    if let Some(output) = &args.output {
        save_report(&report, output).await?;
    }

    println!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );
    println!(
        "{} {}",
        style("Saved:").dim(),
        style(args.output.as_deref().unwrap_or(analysis_path.as_path()).display()).cyan()
    );
    println!("{}", style("─".repeat(60)).dim());

    // Human-readable output
    println!("{}", format_report_readable(&report));

    Ok(())
}
