use crate::{
    qa::LevelQa,
    report::{AnalysisReport, Span},
    types::Level,
};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

fn push_timeline(output: &mut String, spans: &[Span<'_>]) {
    for span in spans {
        output.push_str(&format!(
            "### [{}–{}]\n\n{}\n\n",
            format_timestamp(span.start),
            format_timestamp(span.end),
            span.content
        ));
    }
}

pub fn format_report_readable(report: &AnalysisReport) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "# {}\n\n",
        report.source.as_deref().unwrap_or(&report.media_ref)
    ));
    output.push_str(&format!(
        "**Duration:** {} | **Model:** {} | **Segments:** {}s / {}s\n\n",
        format_timestamp(report.duration),
        report.model.as_deref().unwrap_or("unknown"),
        report.level1_interval,
        report.level2_interval
    ));

    output.push_str("## Overview\n\n");
    match &report.level3_description {
        Some(overview) => output.push_str(&overview.content),
        None => output.push_str("_No overview was generated._"),
    }
    output.push_str("\n\n");

    if !report.level2_descriptions.is_empty() {
        output.push_str("## Plot\n\n");
        push_timeline(&mut output, &report.spans(Level::Plot));
    }

    if !report.level1_descriptions.is_empty() {
        output.push_str("## Segments\n\n");
        push_timeline(&mut output, &report.spans(Level::Segment));
    }

    output
}

pub fn format_qa_readable(results: &[LevelQa]) -> String {
    let mut output = String::new();
    for level in results {
        output.push_str(&format!("## Level {}\n\n", level.level));
        if level.qa_pairs.is_empty() {
            output.push_str("_No question-answer pairs._\n\n");
            continue;
        }
        for pair in &level.qa_pairs {
            output.push_str(&format!(
                "**[{}]** {}\n→ {}\n\n",
                pair.dimension, pair.question, pair.answer
            ));
        }
    }
    output
}
