//! `purr-sim`: drive the companion from a line script on stdin.
//!
//! ```text
//! # comments and blank lines are skipped
//! stroke front          # front | back | side
//! held
//! say hello purr        # keyword spotting over the phrase
//! distance 2.4          # metres
//! look | away | angle 7 # gaze
//! loud 0.3              # microphone level
//! NameHeard             # any engine event name
//! wait 1.5              # seconds, real time
//! status | metrics | quit
//! ```
//!
//! Presentation commands go to stdout as JSON lines; logs go to stderr.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use purr_companion::config::SensorsConfig;
use purr_companion::events::StrokeDirection;
use purr_companion::hooks::{on_head_angle, on_phrase};
use purr_companion::{ChannelPresenter, CompanionConfig, CompanionRuntime, SensorEvent};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to purr.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (defaults to general.log_level)
    #[arg(long)]
    log: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,

    /// Seed the mood RNG for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Do not read or write the baseline database
    #[arg(long)]
    no_persist: bool,
}

/// One parsed script line.
#[derive(Debug, PartialEq)]
enum Line {
    Skip,
    Event(SensorEvent),
    Wait(Duration),
    Status,
    Metrics,
    Quit,
}

#[allow(clippy::cast_possible_truncation)]
fn parse_line(line: &str, sensors: &SensorsConfig) -> Result<Line, String> {
    let line = line.split('#').next().unwrap_or_default().trim();
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(Line::Skip);
    };
    let rest: Vec<&str> = words.collect();
    let number = |what: &str| -> Result<f64, String> {
        rest.first()
            .ok_or_else(|| format!("{what} needs a number"))?
            .parse::<f64>()
            .map_err(|e| format!("{what}: {e}"))
    };

    let parsed = match head.to_ascii_lowercase().as_str() {
        "wait" => {
            let secs = number("wait")?;
            if !(secs.is_finite() && secs >= 0.0) {
                return Err(format!("wait: {secs} is not a duration"));
            }
            Line::Wait(Duration::from_secs_f64(secs))
        }
        "status" => Line::Status,
        "metrics" => Line::Metrics,
        "quit" | "exit" => Line::Quit,
        "held" => Line::Event(SensorEvent::Held),
        "say" => Line::Event(on_phrase(rest.join(" "))),
        "look" => Line::Event(SensorEvent::Gaze { facing: true }),
        "away" => Line::Event(SensorEvent::Gaze { facing: false }),
        "angle" => Line::Event(on_head_angle(number("angle")? as f32, sensors.gaze_angle_degrees)),
        "distance" => Line::Event(SensorEvent::Proximity {
            meters: number("distance")? as f32,
        }),
        "loud" => Line::Event(SensorEvent::Loudness {
            level: number("loud")? as f32,
        }),
        "stroke" => {
            let direction = match rest.first().copied() {
                Some("front") => StrokeDirection::FrontToBack,
                Some("back") => StrokeDirection::BackToFront,
                Some("side") => StrokeDirection::Sideways,
                other => return Err(format!("stroke: expected front|back|side, got {other:?}")),
            };
            Line::Event(SensorEvent::Stroke { direction })
        }
        _ if rest.is_empty() => Line::Event(SensorEvent::Raw {
            name: head.to_string(),
        }),
        _ => return Err(format!("unrecognised line {line:?}")),
    };
    Ok(parsed)
}

fn init_tracing(filter: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.with_ansi(false).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => CompanionConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => CompanionConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.engine.mood.rng_seed = Some(seed);
    }
    if args.no_persist {
        config.engine.persistence.enabled = false;
    }

    let filter = args
        .log
        .clone()
        .unwrap_or_else(|| config.engine.general.log_level.clone());
    init_tracing(&filter, args.json);
    info!(version = env!("CARGO_PKG_VERSION"), "purr-sim starting");

    let (presenter, mut commands) = ChannelPresenter::channel();
    let (runtime, handle) = CompanionRuntime::from_config(&config, presenter);
    let loop_task = tokio::spawn(runtime.run());
    let printer = tokio::spawn(async move {
        while let Some(command) = commands.recv().await {
            match serde_json::to_string(&command) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!(error = %e, "could not encode command"),
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line, &config.sensors) {
            Ok(Line::Skip) => {}
            Ok(Line::Event(event)) => handle.send(event).await?,
            Ok(Line::Wait(duration)) => tokio::time::sleep(duration).await,
            Ok(Line::Status) => {
                let json = handle.engine().lock().snapshot().to_json()?;
                println!("{json}");
            }
            Ok(Line::Metrics) => {
                let text = handle.engine().lock().counters().to_prometheus();
                print!("{text}");
            }
            Ok(Line::Quit) => break,
            Err(reason) => warn!(%reason, "skipping script line"),
        }
    }

    handle.shutdown();
    let summary = loop_task.await??;
    // Last engine reference goes with the handle; that closes the printer.
    drop(handle);
    printer.await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Line, String> {
        parse_line(line, &SensorsConfig::default())
    }

    #[test]
    fn comments_and_blanks_skip() {
        assert_eq!(parse(""), Ok(Line::Skip));
        assert_eq!(parse("   # just a note"), Ok(Line::Skip));
    }

    #[test]
    fn event_names_pass_through() {
        assert_eq!(
            parse("NameHeard"),
            Ok(Line::Event(SensorEvent::Raw {
                name: "NameHeard".into()
            }))
        );
    }

    #[test]
    fn sensor_lines_build_events() {
        assert_eq!(
            parse("stroke front"),
            Ok(Line::Event(SensorEvent::Stroke {
                direction: StrokeDirection::FrontToBack
            }))
        );
        assert_eq!(
            parse("distance 2.5 # walked off"),
            Ok(Line::Event(SensorEvent::Proximity { meters: 2.5 }))
        );
        assert_eq!(parse("angle 3"), Ok(Line::Event(SensorEvent::Gaze { facing: true })));
        assert_eq!(
            parse("say hello there"),
            Ok(Line::Event(SensorEvent::Keyword {
                phrase: "hello there".into()
            }))
        );
    }

    #[test]
    fn wait_parses_seconds() {
        assert_eq!(parse("wait 1.5"), Ok(Line::Wait(Duration::from_millis(1500))));
        assert!(parse("wait").is_err());
        assert!(parse("wait -2").is_err());
    }

    #[test]
    fn unknown_multi_word_line_is_an_error() {
        assert!(parse("make tea").is_err());
        assert!(parse("stroke up").is_err());
    }
}
