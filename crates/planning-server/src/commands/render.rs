//! Render command: runs the pipeline on a saved planning page.

use std::io::{Read, Write};
use std::path::Path;

use chrono::Utc;
use planning_core::{CalendarPipeline, PipelineConfig};
use planning_source::StaticSource;
use tracing::info;

use crate::cli::RenderArgs;
use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::routes::render_feed;

/// The pipeline configuration with command-line overrides applied.
pub fn pipeline_config(config: &ServerConfig, args: &RenderArgs) -> PipelineConfig {
    let mut pipeline = config.pipeline.clone();
    if let Some(mode) = args.mode {
        pipeline = pipeline.with_output_mode(mode);
    }
    if let Some(ref zone) = args.zone {
        pipeline = pipeline.with_zone(zone);
    }
    if let Some(ref marker) = args.marker {
        pipeline = pipeline.with_marker(marker);
    }
    pipeline
}

pub async fn run(config: &ServerConfig, args: &RenderArgs) -> ServerResult<()> {
    let html = read_input(&args.input)?;
    let pipeline = CalendarPipeline::new(pipeline_config(config, args))?;
    let source = StaticSource::new(html).with_name(args.input.display().to_string());

    let ics = render_feed(&source, &pipeline, Utc::now()).await?;

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &ics)?;
            info!(path = %path.display(), bytes = ics.len(), "Wrote calendar");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(ics.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Reads `path`, or stdin when it is `-`.
fn read_input(path: &Path) -> ServerResult<String> {
    if path == Path::new("-") {
        let mut html = String::new();
        std::io::stdin().read_to_string(&mut html)?;
        Ok(html)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}
