use std::path::PathBuf;

use clap::Parser;
use scrawl_config::AppConfig;
use scrawl_engine::assemble::SceneSettings;
use scrawl_engine::door::PolygonVertexTolerance;
use scrawl_engine::layers::DoorNameRule;
use scrawl_io::default_output_path;
use tracing::{info, warn};

use crate::errors::FrontendError;
use crate::loader::{ConversionOutcome, ConversionRequest, convert_file, options_from_config};
use crate::resource_locator::ImageLocator;

/// Convert a DungeonScrawl export into a Universal VTT (.dd2vtt) scene.
#[derive(Debug, Clone, Parser)]
#[command(name = "scrawl2vtt", version, about)]
pub struct Cli {
    /// Path to the DungeonScrawl export file.
    pub source: PathBuf,
    /// Map width in tiles.
    pub map_width: u32,
    /// Map height in tiles.
    pub map_height: u32,
    /// Single tile size in pixels (defaults to the configured value, 70 out of the box).
    pub tile_size: Option<u32>,
    /// Background image to embed into the scene.
    #[arg(long)]
    pub image: Option<PathBuf>,
    /// Output path; defaults to the source path with its last three characters replaced by `.dd2vtt`.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    /// Configuration file to use instead of the discovered one.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Only accept exactly four rectangle vertices for doors with wall stubs.
    #[arg(long)]
    pub strict_doors: bool,
    /// Only treat layers named exactly "Door geometry" as doors.
    #[arg(long)]
    pub exact_door_names: bool,
}

impl Cli {
    /// 合并命令行参数与配置，生成转换请求。
    pub fn to_request(&self, config: &AppConfig) -> ConversionRequest {
        let mut options = options_from_config(&config.conversion);
        if self.strict_doors {
            options.door_tolerance = PolygonVertexTolerance::Strict;
        }
        if self.exact_door_names {
            options.door_name_rule = DoorNameRule::Exact;
        }

        let tile_size = self
            .tile_size
            .unwrap_or(config.conversion.default_tile_size);

        let image = self.image.as_ref().map(|raw| {
            let locator = ImageLocator::from_config(self.source.parent(), config);
            locator.resolve(raw).unwrap_or_else(|| raw.clone())
        });

        ConversionRequest {
            source: self.source.clone(),
            output: self
                .output
                .clone()
                .unwrap_or_else(|| default_output_path(&self.source)),
            image,
            settings: SceneSettings::new(self.map_width, self.map_height, tile_size),
            options,
        }
    }
}

pub fn run(cli: &Cli, config: &AppConfig) -> Result<PathBuf, FrontendError> {
    let request = cli.to_request(config);
    let outcome = convert_file(&request)?;
    report(&request, &outcome);
    Ok(outcome.output)
}

fn report(request: &ConversionRequest, outcome: &ConversionOutcome) {
    let summary = &outcome.report;
    info!(
        wall_layers = summary.wall_layers,
        door_layers = summary.door_layers,
        lines = summary.line_count,
        portals = summary.portal_count,
        "转换统计"
    );
    for geometry_id in &summary.skipped_doors {
        warn!(geometry = %geometry_id, "门几何无法识别，未生成门户");
    }

    if !summary.extent.is_empty() {
        let max = summary.extent.max();
        let size = request.settings.map_size;
        if max.x() > f64::from(size.x) || max.y() > f64::from(size.y) {
            warn!(
                extent_x = max.x(),
                extent_y = max.y(),
                map_width = size.x,
                map_height = size.y,
                "几何范围超出指定的地图尺寸"
            );
        }
    }

    println!("Created {}", outcome.output.display());
}
