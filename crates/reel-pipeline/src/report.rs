//! Reporting sink.
//!
//! Side-effect-only writers for the per-run JSON/Markdown/HTML outputs.
//! Nothing written here is read back by later phases.

use chrono::Utc;

use reel_models::{QualityDimension, QualityReport};

use crate::error::PipelineResult;
use crate::orchestrator::RunReport;
use crate::workdir::RunDir;

/// Persist `qa_report.json` for the latest assessment.
pub async fn write_qa_report(dir: &RunDir, report: &QualityReport) -> PipelineResult<()> {
    let body = serde_json::to_vec_pretty(report)?;
    tokio::fs::write(dir.qa_report_path(), body).await?;
    Ok(())
}

/// Persist the run metadata, the human-readable summary and the HTML
/// preview.
pub async fn write_run_reports(dir: &RunDir, report: &RunReport) -> PipelineResult<()> {
    let metadata = serde_json::to_vec_pretty(report)?;
    tokio::fs::write(dir.metadata_path(), metadata).await?;

    tokio::fs::write(dir.summary_path(), summary_markdown(report)).await?;
    tokio::fs::write(dir.preview_path(), preview_html(report)).await?;
    Ok(())
}

fn summary_markdown(report: &RunReport) -> String {
    let mut md = format!(
        "# Reel Generation Summary\n\n\
         ## Generation Details\n\
         - **Run ID**: {}\n\
         - **Timestamp**: {}\n\
         - **Brief**: {}\n\
         - **Platform**: {}\n\
         - **Duration**: {}s\n\
         - **Content Mode**: {}\n\
         - **Status**: {:?}\n\
         - **Reloop Iterations**: {}\n\
         - **Total Cost**: ${:.2}\n",
        report.run_id,
        Utc::now().format("%Y-%m-%d %H:%M:%S"),
        report.context.brief,
        report.context.platform,
        report.context.target_duration,
        report.context.content_mode,
        report.status,
        report.iterations,
        report.total_cost,
    );

    md.push_str("\n## Phases\n");
    for result in &report.phase_results {
        md.push_str(&format!(
            "- Phase {} ({}): {}{}\n",
            result.phase.number(),
            result.phase,
            result.status,
            if result.fallback_used { " [fallback]" } else { "" },
        ));
    }

    if let Some(outcome) = report.qa_history.last() {
        md.push_str(&format!(
            "\n## Quality Assessment\n- **Overall Score**: {:.3}\n- **Grade**: {:?}\n",
            outcome.report.overall_score, outcome.report.grade,
        ));
        for dim in QualityDimension::ALL {
            md.push_str(&format!(
                "- {}: {:.3}\n",
                dim,
                outcome.report.scores.get(*dim)
            ));
        }
        if !outcome.report.failed_criteria.is_empty() {
            let failed: Vec<&str> = outcome
                .report
                .failed_criteria
                .iter()
                .map(|d| d.as_str())
                .collect();
            md.push_str(&format!("- **Failed criteria**: {}\n", failed.join(", ")));
        }
    }

    if !report.decisions.is_empty() {
        md.push_str("\n## Reloop Decisions\n");
        for decision in &report.decisions {
            md.push_str(&format!(
                "- {} → {} (confidence {:.2}, cost {}): {}\n",
                decision.strategy,
                decision.target_phase,
                decision.confidence,
                decision.estimated_cost,
                decision.reasoning,
            ));
        }
    }

    md.push_str("\n## Generated Files\n");
    md.push_str(&format!(
        "- **Final Reel**: {}\n",
        report
            .final_reel
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "not generated".to_string()),
    ));

    if let Some(failure) = &report.failure {
        md.push_str(&format!("\n## Error Information\n{failure}\n"));
    }

    md
}

fn preview_html(report: &RunReport) -> String {
    let qa = report
        .qa_history
        .last()
        .map(|o| {
            format!(
                "{:.3} ({:?})",
                o.report.overall_score, o.report.pass_status
            )
        })
        .unwrap_or_else(|| "not assessed".to_string());

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Reel Preview - {brief}</title>
  <style>
    body {{ font-family: Arial, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; background-color: #f5f5f5; }}
    .reel-container {{ background: white; padding: 20px; border-radius: 10px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }}
    .metadata {{ background: #f8f9fa; padding: 15px; border-radius: 5px; margin: 10px 0; }}
  </style>
</head>
<body>
  <div class="reel-container">
    <h1>Reel Preview</h1>
    <div class="metadata">
      <h3>Generation Details</h3>
      <p><strong>Brief:</strong> {brief}</p>
      <p><strong>Platform:</strong> {platform}</p>
      <p><strong>Duration:</strong> {duration}s</p>
      <p><strong>Mode:</strong> {mode}</p>
    </div>
    <div class="metadata">
      <h3>Video</h3>
      <p>File: {reel}</p>
    </div>
    <div class="metadata">
      <h3>Quality Assessment</h3>
      <p><strong>Overall Score:</strong> {qa}</p>
      <p><strong>Status:</strong> {status:?}</p>
    </div>
  </div>
</body>
</html>"#,
        brief = report.context.brief,
        platform = report.context.platform,
        duration = report.context.target_duration,
        mode = report.context.content_mode,
        reel = report
            .final_reel
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "not generated".to_string()),
        qa = qa,
        status = report.status,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::RunStatus;
    use reel_models::{ContentMode, PipelineContext, Platform, RunId};

    fn report() -> RunReport {
        RunReport {
            run_id: RunId::new(),
            status: RunStatus::Degraded,
            context: PipelineContext::new(
                "30s fashion showcase",
                Platform::Instagram,
                30,
                ContentMode::Music,
                "/tmp/run",
            ),
            iterations: 1,
            total_cost: 1.47,
            final_reel: Some("/tmp/run/final_reel.mp4".into()),
            qa_history: vec![],
            decisions: vec![],
            phase_results: vec![],
            failure: None,
        }
    }

    #[test]
    fn summary_lists_run_details() {
        let md = summary_markdown(&report());
        assert!(md.contains("30s fashion showcase"));
        assert!(md.contains("instagram"));
        assert!(md.contains("$1.47"));
        assert!(md.contains("Degraded"));
    }

    #[test]
    fn preview_is_complete_html() {
        let html = preview_html(&report());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("final_reel.mp4"));
        assert!(html.ends_with("</html>"));
    }

    #[tokio::test]
    async fn reports_land_in_the_run_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = RunDir::at(tmp.path());
        write_run_reports(&dir, &report()).await.unwrap();
        assert!(dir.metadata_path().exists());
        assert!(dir.summary_path().exists());
        assert!(dir.preview_path().exists());
    }
}
