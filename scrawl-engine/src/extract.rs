use scrawl_core::geometry::Point2;
use scrawl_core::source::{GeometryBundle, PolygonContainer, Polyline, SourceDocument};
use tracing::debug;

use crate::errors::EngineError;

/// 所有墙体图层合并后的原始几何。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WallGeometry {
    pub polygons: Vec<PolygonContainer>,
    pub polylines: Vec<Polyline>,
}

impl WallGeometry {
    /// 每个多边形环与每条多段线各自成为一条阻挡线（先多边形后多段线）。
    /// 少于两个点的序列无法构成线段，直接丢弃。
    pub fn obstruction_lines(&self) -> Vec<Vec<Point2>> {
        let rings = self.polygons.iter().flat_map(|container| container.rings.iter());
        rings
            .chain(self.polylines.iter())
            .filter(|points| {
                let usable = points.len() >= 2;
                if !usable {
                    debug!(points = points.len(), "丢弃不足两个点的墙体折线");
                }
                usable
            })
            .cloned()
            .collect()
    }
}

/// 单个门图层对应的完整几何包。
#[derive(Debug, Clone, Copy)]
pub struct DoorGeometry<'a> {
    pub geometry_id: &'a str,
    pub bundle: &'a GeometryBundle,
}

fn lookup<'a>(document: &'a SourceDocument, id: &str) -> Result<&'a GeometryBundle, EngineError> {
    if let Some(bundle) = document.geometry(id) {
        return Ok(bundle);
    }
    match document.malformed_geometry(id) {
        Some(reason) => Err(EngineError::MalformedGeometry {
            id: id.to_string(),
            reason: reason.to_string(),
        }),
        None => Err(EngineError::MissingGeometry(id.to_string())),
    }
}

/// 合并墙体几何，保持 ID 列表顺序。
pub fn extract_walls(
    document: &SourceDocument,
    geometry_ids: &[String],
) -> Result<WallGeometry, EngineError> {
    let mut walls = WallGeometry::default();
    for id in geometry_ids {
        let bundle = lookup(document, id)?;
        walls.polygons.extend(bundle.polygons.iter().cloned());
        walls.polylines.extend(bundle.polylines.iter().cloned());
    }
    Ok(walls)
}

/// 门几何不做合并，逐图层保留以便判定门的拓扑。
pub fn extract_doors<'a>(
    document: &'a SourceDocument,
    geometry_ids: &'a [String],
) -> Result<Vec<DoorGeometry<'a>>, EngineError> {
    geometry_ids
        .iter()
        .map(|id| {
            Ok(DoorGeometry {
                geometry_id: id.as_str(),
                bundle: lookup(document, id)?,
            })
        })
        .collect()
}
