use scrawl_core::geometry::{Bounds2D, Point2};
use scrawl_core::scene::OutputScene;
use scrawl_core::source::SourceDocument;
use tracing::{debug, info};

use crate::assemble::{SceneSettings, assemble_scene};
use crate::door::{PolygonVertexTolerance, ThresholdLine, classify_door, resolve_threshold_line};
use crate::errors::EngineError;
use crate::extract::{extract_doors, extract_walls};
use crate::layers::{DoorNameRule, collect_geometry_ids};
use crate::normalize::{DEFAULT_UNITS_PER_CELL, OriginOffset};
use crate::portal::build_portals;

/// 单次转换的可调参数。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionOptions {
    pub door_name_rule: DoorNameRule,
    pub door_tolerance: PolygonVertexTolerance,
    pub units_per_cell: f64,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            door_name_rule: DoorNameRule::default(),
            door_tolerance: PolygonVertexTolerance::default(),
            units_per_cell: DEFAULT_UNITS_PER_CELL,
        }
    }
}

impl ConversionOptions {
    fn scale(&self) -> Result<f64, EngineError> {
        if self.units_per_cell.is_finite() && self.units_per_cell > 0.0 {
            Ok(1.0 / self.units_per_cell)
        } else {
            Err(EngineError::InvalidScale(self.units_per_cell))
        }
    }
}

/// 转换过程的统计，便于前端输出摘要。
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    pub wall_layers: usize,
    pub door_layers: usize,
    pub skipped_doors: Vec<String>,
    pub line_count: usize,
    pub portal_count: usize,
    /// 归一化后（网格单位）所有输出点的范围。
    pub extent: Bounds2D,
}

#[derive(Debug, Clone)]
pub struct Conversion {
    pub scene: OutputScene,
    pub report: ConversionReport,
}

/// 一次转换的上下文。原点偏移只属于这一次运行，运行结束即随之销毁。
#[derive(Debug)]
pub struct ConversionRun<'a> {
    document: &'a SourceDocument,
    options: ConversionOptions,
    offset: OriginOffset,
}

impl<'a> ConversionRun<'a> {
    pub fn new(document: &'a SourceDocument, options: ConversionOptions) -> Self {
        Self {
            document,
            options,
            offset: OriginOffset::new(),
        }
    }

    /// 执行完整流程：分类 → 提取 → 门槛线 → 统一偏移 → 归一化 → 门户 → 组装。
    pub fn execute(
        mut self,
        settings: &SceneSettings,
        image: Option<String>,
    ) -> Result<Conversion, EngineError> {
        let scale = self.options.scale()?;
        let ids = collect_geometry_ids(self.document, self.options.door_name_rule);
        debug!(walls = ?ids.walls, doors = ?ids.doors, "几何图层分类完成");

        let wall_lines = extract_walls(self.document, &ids.walls)?.obstruction_lines();
        let (door_lines, skipped_doors) = self.resolve_doors(&ids.doors)?;

        // 偏移必须覆盖墙体与门两部分后才能应用
        for line in &wall_lines {
            self.offset.observe_all(line);
        }
        for line in &door_lines {
            self.offset.observe_all(line);
        }
        if self.offset.is_empty() {
            debug!("未观察到任何几何点，坐标不做平移");
        } else {
            debug!(offset = ?self.offset.value(), scale, "原点偏移已确定");
        }

        let normalizer = self.offset.normalizer(scale);
        let line_of_sight = normalizer.apply_lines(&wall_lines);
        let thresholds: Vec<ThresholdLine> = door_lines
            .iter()
            .map(|[start, end]| [normalizer.apply(*start), normalizer.apply(*end)])
            .collect();
        let portals = build_portals(&thresholds);

        let mut extent = Bounds2D::empty();
        for point in line_of_sight.iter().flatten() {
            extent.include_point(Point2::from(*point));
        }
        for point in thresholds.iter().flatten() {
            extent.include_point(*point);
        }

        let report = ConversionReport {
            wall_layers: ids.walls.len(),
            door_layers: ids.doors.len(),
            skipped_doors,
            line_count: line_of_sight.len(),
            portal_count: portals.len(),
            extent,
        };
        info!(
            lines = report.line_count,
            portals = report.portal_count,
            skipped_doors = report.skipped_doors.len(),
            "场景转换完成"
        );

        let scene = assemble_scene(settings, line_of_sight, portals, image);
        Ok(Conversion { scene, report })
    }

    /// 逐个门判定类型并求门槛线；无法识别的门被跳过并记录其几何 ID。
    fn resolve_doors(
        &self,
        geometry_ids: &[String],
    ) -> Result<(Vec<ThresholdLine>, Vec<String>), EngineError> {
        let mut lines = Vec::new();
        let mut skipped = Vec::new();
        for door in extract_doors(self.document, geometry_ids)? {
            let door_type = classify_door(door.bundle, self.options.door_tolerance);
            debug!(geometry = door.geometry_id, ?door_type, "门类型判定");
            match resolve_threshold_line(door.bundle, door_type) {
                Some(line) => lines.push(line),
                None => {
                    debug!(
                        geometry = door.geometry_id,
                        ?door_type,
                        polylines = door.bundle.polylines.len(),
                        polygons = door.bundle.polygons.len(),
                        "无法识别的门几何，已跳过"
                    );
                    skipped.push(door.geometry_id.to_string());
                }
            }
        }
        Ok((lines, skipped))
    }
}

/// 便捷入口：为一次转换创建独立的上下文并执行。
pub fn convert(
    document: &SourceDocument,
    options: ConversionOptions,
    settings: &SceneSettings,
    image: Option<String>,
) -> Result<Conversion, EngineError> {
    ConversionRun::new(document, options).execute(settings, image)
}
