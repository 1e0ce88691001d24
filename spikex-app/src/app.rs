use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use spikex_core::{BlockReader, Session};
use spikex_exclusion::{DEFAULT_EXCLUSION_FILE_PREFIX, TrialExclusion};
use spikex_extract::{ExtractionConfig, SessionProcessor};
use spikex_render::{HeatmapRenderer, RenderError};
use spikex_transform::{ChannelRemapper, DEFAULT_MAP_FILE_PREFIX, Pipeline};
use tracing::{debug, info, warn};

use crate::block_file::JsonBlockFile;
use crate::cli::{Cli, Command, init_logging};
use crate::simulate::Simulation;

/// What `extract` writes out
#[derive(Serialize)]
struct Report<'a> {
    block: String,
    config: &'a ExtractionConfig,
    stages: Vec<&'static str>,
    session: &'a Session,
}

pub struct App {
    command: Command,
}

impl App {
    pub fn new() -> Result<Self> {
        let cli = Cli::parse();
        init_logging(&cli.log_level)?;
        info!("spikex v{}", env!("CARGO_PKG_VERSION"));
        Ok(Self::from_command(cli.command))
    }

    pub fn from_command(command: Command) -> Self {
        Self { command }
    }

    pub fn run(self) -> Result<()> {
        match self.command {
            Command::Extract {
                block,
                config,
                channel_map,
                exclusions,
                output,
                heatmaps,
                from,
                to,
            } => {
                let config = load_config(config.as_deref(), from, to)?;
                let options = ExtractOptions {
                    channel_map,
                    exclusions,
                    output,
                    heatmaps,
                };
                extract(&block, config, &options)
            }
            Command::Simulate {
                output,
                trials,
                tones,
                channels,
                seed,
            } => {
                let sim = Simulation {
                    trials,
                    tones_per_trial: tones,
                    channels,
                    seed,
                    ..Simulation::default()
                };
                let config = ExtractionConfig {
                    channel_count: usize::from(channels),
                    ..ExtractionConfig::default()
                };
                sim.generate(&config)
                    .write(&output)
                    .with_context(|| format!("writing simulated block to {}", output.display()))?;
                info!(path = %output.display(), trials, tones, channels, "wrote simulated block");
                Ok(())
            }
            Command::Summary { config, block } => {
                let config = load_config(config.as_deref(), None, None)?;
                let block = block
                    .map(|b| b.display().to_string())
                    .unwrap_or_else(|| "<none>".into());
                print!("{}", config.parameter_summary(&block));
                Ok(())
            }
        }
    }
}

struct ExtractOptions {
    channel_map: Option<PathBuf>,
    exclusions: Option<PathBuf>,
    output: Option<PathBuf>,
    heatmaps: Option<PathBuf>,
}

/// Defaults, overridden by the config file, overridden by the command line
fn load_config(
    path: Option<&Path>,
    from: Option<f64>,
    to: Option<f64>,
) -> Result<ExtractionConfig> {
    let mut config = match path {
        Some(path) => ExtractionConfig::from_json_path(path)?,
        None => ExtractionConfig::default(),
    };
    if let Some(from) = from {
        config.trial_window.from = from;
    }
    if let Some(to) = to {
        config.trial_window.to = to;
    }
    config.validate()?;
    Ok(config)
}

fn block_dir(block: &Path) -> PathBuf {
    match block.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn build_pipeline(block: &Path, channel_map: Option<&Path>) -> Result<Pipeline> {
    let remapper = match channel_map {
        Some(path) => Some(ChannelRemapper::from_path(path)?),
        None => ChannelRemapper::from_autofind_in_path(&block_dir(block), DEFAULT_MAP_FILE_PREFIX)?,
    };
    let mut pipeline = Pipeline::new();
    match remapper {
        Some(remapper) => {
            info!(channels = remapper.map().len(), "remapping channels");
            pipeline.push(remapper);
        }
        None => debug!("no channel map, keeping acquisition channel order"),
    }
    Ok(pipeline)
}

fn extract(block: &Path, config: ExtractionConfig, options: &ExtractOptions) -> Result<()> {
    let pipeline = build_pipeline(block, options.channel_map.as_deref())?;
    let exclusion_dir = options
        .exclusions
        .clone()
        .unwrap_or_else(|| block_dir(block));
    let exclusions =
        TrialExclusion::from_autofind_in_path(&exclusion_dir, DEFAULT_EXCLUSION_FILE_PREFIX)?;
    info!(count = exclusions.len(), dir = %exclusion_dir.display(), "loaded exclusions");

    let reader = JsonBlockFile::new(block);
    let describe = reader.describe();
    let mut processor = SessionProcessor::new(reader, config)?.with_pipeline(pipeline);
    debug!("\n{}", processor.parameter_summary());

    let session = processor
        .extract(&exclusions)
        .with_context(|| format!("extracting {describe}"))?;
    for (stage, stats) in processor.timer().stages() {
        debug!(stage, runs = stats.runs, mean = ?stats.mean(), "stage timing");
    }

    let report = Report {
        block: describe,
        config: processor.config(),
        stages: processor.pipeline().stage_names(),
        session: &session,
    };
    match &options.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            let mut w = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut w, &report)?;
            w.flush()?;
            info!(path = %path.display(), "wrote session");
        }
        None => {
            let mut w = io::stdout().lock();
            serde_json::to_writer_pretty(&mut w, &report)?;
            writeln!(w)?;
        }
    }

    if let Some(dir) = &options.heatmaps {
        let written = write_heatmaps(&session, dir)?;
        info!(dir = %dir.display(), written, "wrote heatmaps");
    }
    Ok(())
}

/// One in/out pair per included trial; returns the number of images written
fn write_heatmaps(session: &Session, dir: &Path) -> Result<usize> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let renderer = HeatmapRenderer::default();
    let mut written = 0;
    for trial in session.included() {
        let Some((in_counts, out_counts)) = trial.counts() else {
            continue;
        };
        for (label, counts) in [("in", in_counts), ("out", out_counts)] {
            let path = dir.join(format!("trial-{}-{label}.png", trial.trial_number));
            match renderer.save_png(counts, &path) {
                Ok(()) => written += 1,
                Err(RenderError::Empty { .. }) => {
                    warn!(trial = trial.trial_number, "no stimuli, skipping heatmap")
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn simulate(dir: &Path, trials: usize) -> PathBuf {
        let path = dir.join("block.json");
        App::from_command(Command::Simulate {
            output: path.clone(),
            trials,
            tones: 4,
            channels: 8,
            seed: 3,
        })
        .run()
        .unwrap();
        path
    }

    fn extract_command(block: PathBuf, output: PathBuf) -> Command {
        Command::Extract {
            block,
            config: None,
            channel_map: None,
            exclusions: None,
            output: Some(output),
            heatmaps: None,
            from: None,
            to: None,
        }
    }

    fn read_report(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    fn write_config(dir: &Path) -> PathBuf {
        let path = dir.join("extract.json");
        fs::write(&path, r#"{ "channel_count": 8 }"#).unwrap();
        path
    }

    #[test]
    fn simulate_then_extract() {
        let dir = tempfile::tempdir().unwrap();
        let block = simulate(dir.path(), 3);
        let output = dir.path().join("session.json");
        let heatmaps = dir.path().join("maps");
        let mut command = extract_command(block, output.clone());
        if let Command::Extract {
            config, heatmaps: h, ..
        } = &mut command
        {
            *config = Some(write_config(dir.path()));
            *h = Some(heatmaps.clone());
        }
        App::from_command(command).run().unwrap();

        let report = read_report(&output);
        let trials = report["session"]["trials"].as_array().unwrap();
        assert_eq!(trials.len(), 3);
        assert_eq!(trials[0]["trial_number"], 1);
        assert_eq!(trials[0]["stimuli"].as_array().unwrap().len(), 4);
        assert_eq!(trials[0]["outcome"]["status"], "included");
        assert!(heatmaps.join("trial-3-out.png").exists());
    }

    #[test]
    fn exclusions_and_channel_map_are_found_next_to_the_block() {
        let dir = tempfile::tempdir().unwrap();
        let block = simulate(dir.path(), 2);
        fs::write(
            dir.path().join("exclude.txt"),
            "Exclude after: 1s\nnoisy reference\n",
        )
        .unwrap();
        let mut map = String::from("TDT\tMapping\n");
        for ch in 1..=8 {
            map.push_str(&format!("{ch}\t{}\n", 9 - ch));
        }
        fs::write(dir.path().join("Channel Map.txt"), map).unwrap();

        let output = dir.path().join("session.json");
        let mut command = extract_command(block, output.clone());
        if let Command::Extract { config, .. } = &mut command {
            *config = Some(write_config(dir.path()));
        }
        App::from_command(command).run().unwrap();

        let report = read_report(&output);
        assert_eq!(report["stages"][0], "channel remap");
        let trials = report["session"]["trials"].as_array().unwrap();
        assert_eq!(trials[0]["outcome"]["status"], "included");
        assert_eq!(trials[1]["outcome"]["status"], "excluded");
        assert_eq!(trials[1]["outcome"]["reason"], "noisy reference");
    }

    #[test]
    fn cli_window_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        fs::write(&path, r#"{ "trial_window": { "from": 0.0, "to": 3.0 } }"#).unwrap();
        let config = load_config(Some(&path), Some(-1.0), None).unwrap();
        assert_eq!(config.trial_window.from, -1.0);
        assert_eq!(config.trial_window.to, 3.0);
        assert!(load_config(Some(&path), Some(5.0), None).is_err());
    }

    #[test]
    fn cli_window_repairs_invalid_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        fs::write(&path, r#"{ "trial_window": { "from": 5.0, "to": 1.0 } }"#).unwrap();
        assert!(load_config(Some(&path), None, None).is_err());
        let config = load_config(Some(&path), Some(0.0), None).unwrap();
        assert_eq!(config.trial_window.from, 0.0);
        assert_eq!(config.trial_window.to, 1.0);
    }

    #[test]
    fn block_dir_of_bare_file_name() {
        assert_eq!(block_dir(Path::new("block.json")), PathBuf::from("."));
        assert_eq!(block_dir(Path::new("/data/b.json")), PathBuf::from("/data"));
    }
}
