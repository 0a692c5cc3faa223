use autotrack::image::io::load_frames;
use autotrack::{
    Advance, AutoTracker, FrameData, MaskShape, MatcherConfig, OptionValues, Options, TargetPoint,
    TrackId,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Template point tracker (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum MaskShapeConfig {
    Ellipse,
    Rectangle,
}

impl From<MaskShapeConfig> for MaskShape {
    fn from(value: MaskShapeConfig) -> Self {
        match value {
            MaskShapeConfig::Ellipse => MaskShape::Ellipse,
            MaskShapeConfig::Rectangle => MaskShape::Rectangle,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct OptionsJson {
    good_match: f32,
    evolve_rate: Option<u32>,
    evolve_alpha: u8,
    auto_skip_count: usize,
    line_spread: i32,
    line_angle_deg: f32,
    mask_shape: MaskShapeConfig,
    mask_width: usize,
    mask_height: usize,
    look_ahead: bool,
    search_margin: usize,
}

impl Default for OptionsJson {
    fn default() -> Self {
        let values = OptionValues::default();
        Self {
            good_match: values.good_match,
            evolve_rate: None,
            evolve_alpha: values.evolve_alpha,
            auto_skip_count: values.auto_skip_count,
            line_spread: values.line_spread,
            line_angle_deg: values.line_angle_deg,
            mask_shape: MaskShapeConfig::Ellipse,
            mask_width: values.mask_width,
            mask_height: values.mask_height,
            look_ahead: values.look_ahead,
            search_margin: values.search_margin,
        }
    }
}

impl OptionsJson {
    fn into_options(self) -> Result<Options, Box<dyn std::error::Error>> {
        let mut options = Options::from_values(OptionValues {
            good_match: self.good_match,
            evolve_alpha: self.evolve_alpha,
            auto_skip_count: self.auto_skip_count,
            line_spread: self.line_spread,
            line_angle_deg: self.line_angle_deg,
            mask_shape: self.mask_shape.into(),
            mask_width: self.mask_width,
            mask_height: self.mask_height,
            look_ahead: self.look_ahead,
            search_margin: self.search_margin,
        })?;
        if let Some(rate) = self.evolve_rate {
            options.set_evolve_rate(rate);
        }
        Ok(options)
    }
}

#[derive(Debug, Deserialize)]
struct KeyFrameJson {
    frame: usize,
    x: f32,
    y: f32,
    center_x: Option<f32>,
    center_y: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    frames: Vec<String>,
    key_frames: Vec<KeyFrameJson>,
    last_frame: Option<usize>,
    output_path: Option<String>,
    parallel: bool,
    options: OptionsJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frames: Vec::new(),
            key_frames: Vec::new(),
            last_frame: None,
            output_path: None,
            parallel: false,
            options: OptionsJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FrameRecord {
    frame: usize,
    state: &'static str,
    x: Option<f32>,
    y: Option<f32>,
    score: Option<f32>,
    key_frame: Option<usize>,
    consecutive_failures: usize,
}

impl From<&FrameData> for FrameRecord {
    fn from(value: &FrameData) -> Self {
        let location = value.location();
        Self {
            frame: value.frame(),
            state: value.state().as_str(),
            x: location.map(|p| p.x),
            y: location.map(|p| p.y),
            score: value.score(),
            key_frame: value.key_frame(),
            consecutive_failures: value.consecutive_failures(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Status {
    Reached { frame: usize },
    Halted { frame: usize, consecutive_failures: usize },
    Cancelled { last_frame: usize },
    NoKeyFrame,
}

impl From<&Advance> for Status {
    fn from(value: &Advance) -> Self {
        match value {
            Advance::Reached(data) => Status::Reached {
                frame: data.frame(),
            },
            Advance::Halted {
                frame,
                consecutive_failures,
            } => Status::Halted {
                frame: *frame,
                consecutive_failures: *consecutive_failures,
            },
            Advance::Cancelled { last_frame } => Status::Cancelled {
                last_frame: *last_frame,
            },
            Advance::NoKeyFrame => Status::NoKeyFrame,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    status: Status,
    frames: Vec<FrameRecord>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("autotrack=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.frames.is_empty() {
        return Err("frames must list at least one image".into());
    }
    if config.key_frames.is_empty() {
        return Err("key_frames must contain at least one entry".into());
    }

    let frames = load_frames(&config.frames)?;
    let last_frame = config
        .last_frame
        .unwrap_or(frames.len() - 1)
        .min(frames.len() - 1);
    let options = config.options.into_options()?;
    let mut tracker = AutoTracker::with_options(frames, options).with_matcher_config(
        MatcherConfig {
            parallel: config.parallel,
            ..MatcherConfig::default()
        },
    );
    tracker.set_track(Some(TrackId(0)));
    for kf in &config.key_frames {
        let center_x = kf.center_x.unwrap_or(kf.x);
        let center_y = kf.center_y.unwrap_or(kf.y);
        tracker.add_key_frame(TargetPoint::new(kf.frame, kf.x, kf.y), center_x, center_y)?;
    }

    let first = config
        .key_frames
        .iter()
        .map(|kf| kf.frame)
        .min()
        .unwrap_or(0);
    let advance = tracker.advance_to(last_frame, None)?;
    tracing::info!(status = ?Status::from(&advance), "tracking finished");

    let mut records = Vec::new();
    for frame in first..=last_frame {
        let data = tracker.get_frame(frame)?;
        records.push(FrameRecord::from(&data));
    }
    let output = Output {
        status: Status::from(&advance),
        frames: records,
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
