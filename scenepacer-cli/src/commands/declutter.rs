//! Declutter command - place labels for a JSON anchor file.
//!
//! Input format:
//!
//! ```json
//! { "anchors": [ { "id": 1, "lon": 2.35, "lat": 48.85, "height": 0 } ] }
//! ```
//!
//! Placements are written to stdout as JSON; the relaxation summary goes to
//! stderr so the output can be piped.

use std::collections::HashSet;
use std::path::PathBuf;

use clap::Args;
use scenepacer::config::ConfigFile;
use scenepacer::declutter::{declutter_with_report, AnchorPoint, DeclutterConfig, DeclutterReport};
use scenepacer::geometry::Cartesian3;
use serde::Deserialize;

use crate::error::CliError;

/// Arguments for the declutter command.
#[derive(Debug, Args)]
pub struct DeclutterArgs {
    /// Anchor file (JSON)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Reference centre as lon,lat,height (defaults to the anchor centroid)
    #[arg(long, value_parser = parse_center)]
    pub center: Option<Cartesian3>,

    /// Minimum label separation in metres
    #[arg(long)]
    pub min_separation: Option<f64>,

    /// Initial leader length in metres
    #[arg(long)]
    pub base_length: Option<f64>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Deserialize)]
struct AnchorFile {
    anchors: Vec<AnchorEntry>,
}

#[derive(Debug, Deserialize)]
struct AnchorEntry {
    id: u32,
    lon: f64,
    lat: f64,
    #[serde(default)]
    height: f64,
}

/// Run the declutter command.
pub fn run(args: DeclutterArgs, config: &ConfigFile) -> Result<(), CliError> {
    let text = std::fs::read_to_string(&args.input).map_err(|source| CliError::Io {
        path: args.input.clone(),
        source,
    })?;
    let anchors = parse_anchors(&text)?;

    let mut declutter_config = config.declutter.clone();
    if let Some(distance) = args.min_separation {
        declutter_config = declutter_config.with_min_separation(distance);
    }
    if let Some(length) = args.base_length {
        declutter_config = declutter_config.with_base_leader_length(length);
    }

    let report = place_labels(&anchors, args.center, &declutter_config);

    let json = if args.pretty {
        serde_json::to_string_pretty(&report.placements)?
    } else {
        serde_json::to_string(&report.placements)?
    };
    println!("{}", json);

    eprintln!(
        "{} labels, {} iterations, {} adjustments, {} residual collisions",
        report.placements.len(),
        report.iterations,
        report.adjustments,
        report.residual_collisions
    );

    Ok(())
}

/// Parse and validate an anchor file.
fn parse_anchors(text: &str) -> Result<Vec<AnchorPoint>, CliError> {
    let file: AnchorFile = serde_json::from_str(text)?;
    let mut seen = HashSet::new();

    file.anchors
        .into_iter()
        .map(|entry| {
            if !(entry.lon.is_finite() && entry.lat.is_finite() && entry.height.is_finite()) {
                return Err(CliError::Input(format!(
                    "anchor {} has a non-finite coordinate",
                    entry.id
                )));
            }
            if !(-90.0..=90.0).contains(&entry.lat) {
                return Err(CliError::Input(format!(
                    "anchor {} latitude {} is out of range",
                    entry.id, entry.lat
                )));
            }
            if !seen.insert(entry.id) {
                return Err(CliError::Input(format!("duplicate anchor id {}", entry.id)));
            }
            Ok(AnchorPoint::new(
                entry.id,
                Cartesian3::from_degrees(entry.lon, entry.lat, entry.height),
            ))
        })
        .collect()
}

fn place_labels(
    anchors: &[AnchorPoint],
    center: Option<Cartesian3>,
    config: &DeclutterConfig,
) -> DeclutterReport {
    let center = center.unwrap_or_else(|| centroid(anchors));
    declutter_with_report(anchors, center, config)
}

/// Mean anchor position, or the origin for an empty set.
fn centroid(anchors: &[AnchorPoint]) -> Cartesian3 {
    if anchors.is_empty() {
        return Cartesian3::new(0.0, 0.0, 0.0);
    }
    let sum = anchors
        .iter()
        .fold(Cartesian3::new(0.0, 0.0, 0.0), |acc, a| acc + a.position);
    sum * (1.0 / anchors.len() as f64)
}

/// Parse `lon,lat[,height]` in degrees and metres.
fn parse_center(value: &str) -> Result<Cartesian3, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 2 && parts.len() != 3 {
        return Err(format!("expected lon,lat[,height], got '{}'", value));
    }

    let mut numbers = Vec::with_capacity(3);
    for part in &parts {
        let number: f64 = part
            .parse()
            .map_err(|_| format!("'{}' is not a number", part))?;
        if !number.is_finite() {
            return Err(format!("'{}' is not finite", part));
        }
        numbers.push(number);
    }
    let height = numbers.get(2).copied().unwrap_or(0.0);

    Ok(Cartesian3::from_degrees(numbers[0], numbers[1], height))
}
