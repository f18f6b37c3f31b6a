use scrawl_core::geometry::{Point2, Vector2};
use scrawl_core::source::GeometryBundle;
use tracing::{debug, warn};

/// 门的代表线段（门槛线）。
pub type ThresholdLine = [Point2; 2];

/// A 型门中矩形允许的顶点总数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolygonVertexTolerance {
    /// 恰好 4 个顶点。
    Strict,
    /// 4 或 5 个顶点（容忍重复的闭合点）。
    #[default]
    Permissive,
}

impl PolygonVertexTolerance {
    #[inline]
    pub fn accepts(self, vertex_count: usize) -> bool {
        match self {
            PolygonVertexTolerance::Strict => vertex_count == 4,
            PolygonVertexTolerance::Permissive => matches!(vertex_count, 4 | 5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorType {
    Invalid,
    /// 矩形两侧各带一段短墙的门。
    TypeA,
    /// 只有一个矩形的门。
    TypeB,
}

/// 仅依据多段线与多边形的数量形状判定门的拓扑。
pub fn classify_door(bundle: &GeometryBundle, tolerance: PolygonVertexTolerance) -> DoorType {
    let polyline_count = bundle.polylines.len();
    let container_count = bundle.polygons.len();

    if polyline_count == 2 && container_count == 1 {
        let polygon_vertices = bundle.polygons[0].vertex_count();
        if bundle.polyline_vertex_count() == 4 && tolerance.accepts(polygon_vertices) {
            return DoorType::TypeA;
        }
    }

    if polyline_count == 0 && container_count == 1 {
        return DoorType::TypeB;
    }

    DoorType::Invalid
}

/// 按门的类型推导门槛线；几何形状不足以取到约定的顶点时返回 `None`。
pub fn resolve_threshold_line(
    bundle: &GeometryBundle,
    door_type: DoorType,
) -> Option<ThresholdLine> {
    match door_type {
        DoorType::Invalid => None,
        DoorType::TypeA => type_a_line(bundle),
        DoorType::TypeB => type_b_line(bundle),
    }
}

/// 第一条短墙的 0 号点到第二条短墙的 1 号点。
fn type_a_line(bundle: &GeometryBundle) -> Option<ThresholdLine> {
    let start = *bundle.polylines.first()?.first()?;
    let end = *bundle.polylines.get(1)?.get(1)?;
    Some([start, end])
}

/// 矩形第一个环的 (0,1) 边是长边；沿短边方向平移半个短边，得到中线。
fn type_b_line(bundle: &GeometryBundle) -> Option<ThresholdLine> {
    let ring = bundle.polygons.first()?.first_ring()?;
    if ring.len() < 3 {
        debug!(vertices = ring.len(), "B 型门的外环顶点不足");
        return None;
    }
    let (a, b, c) = (ring[0], ring[1], ring[2]);

    let long_edge = Vector2::from_points(a, b);
    let short_edge = Vector2::from_points(b, c);
    if long_edge.length_squared() == 0.0 {
        debug!("B 型门的长边退化为一个点");
        return None;
    }
    if long_edge.length_squared() < short_edge.length_squared() {
        warn!(
            x = a.x(),
            y = a.y(),
            "B 型门的 (0,1) 边短于 (1,2) 边，顶点顺序与约定不符"
        );
    }

    // offset = (ring[1] - ring[2]) / 2，门槛线 = 长边 - offset
    let shift = short_edge.scale(0.5);
    Some([a.translate(shift), b.translate(shift)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrawl_core::source::PolygonContainer;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn rectangle() -> Vec<Point2> {
        vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 2.0), p(0.0, 2.0)]
    }

    fn type_a_bundle(ring: Vec<Point2>) -> GeometryBundle {
        GeometryBundle::new(
            vec![PolygonContainer::new(vec![ring])],
            vec![vec![p(-3.0, 1.0), p(-1.0, 1.0)], vec![p(11.0, 1.0), p(13.0, 1.0)]],
        )
    }

    #[test]
    fn stub_walls_with_rectangle_is_type_a() {
        let bundle = type_a_bundle(rectangle());
        let door_type = classify_door(&bundle, PolygonVertexTolerance::Strict);
        assert_eq!(door_type, DoorType::TypeA);

        let line = resolve_threshold_line(&bundle, door_type).expect("type A line");
        assert_eq!(line, [p(-3.0, 1.0), p(13.0, 1.0)]);
    }

    #[test]
    fn closing_vertex_depends_on_tolerance() {
        let mut ring = rectangle();
        ring.push(p(0.0, 0.0));
        let bundle = type_a_bundle(ring);
        assert_eq!(
            classify_door(&bundle, PolygonVertexTolerance::Permissive),
            DoorType::TypeA
        );
        assert_eq!(
            classify_door(&bundle, PolygonVertexTolerance::Strict),
            DoorType::Invalid
        );
    }

    #[test]
    fn lone_rectangle_is_type_b_with_midline() {
        let bundle = GeometryBundle::new(vec![PolygonContainer::new(vec![rectangle()])], vec![]);
        let door_type = classify_door(&bundle, PolygonVertexTolerance::Permissive);
        assert_eq!(door_type, DoorType::TypeB);

        let line = resolve_threshold_line(&bundle, door_type).expect("type B line");
        assert_eq!(line, [p(0.0, 1.0), p(10.0, 1.0)]);
    }

    #[test]
    fn type_b_midline_for_rotated_rectangle() {
        let ring = vec![p(5.0, 5.0), p(5.0, 15.0), p(9.0, 15.0), p(9.0, 5.0)];
        let bundle = GeometryBundle::new(vec![PolygonContainer::new(vec![ring])], vec![]);
        let line = resolve_threshold_line(&bundle, DoorType::TypeB).expect("type B line");
        assert_eq!(line, [p(7.0, 5.0), p(7.0, 15.0)]);
    }

    #[test]
    fn unexpected_shapes_are_invalid() {
        let single_polyline = GeometryBundle::new(
            vec![PolygonContainer::new(vec![rectangle()])],
            vec![vec![p(0.0, 0.0), p(1.0, 0.0)]],
        );
        assert_eq!(
            classify_door(&single_polyline, PolygonVertexTolerance::Permissive),
            DoorType::Invalid
        );

        let two_containers = GeometryBundle::new(
            vec![
                PolygonContainer::new(vec![rectangle()]),
                PolygonContainer::new(vec![rectangle()]),
            ],
            vec![],
        );
        assert_eq!(
            classify_door(&two_containers, PolygonVertexTolerance::Permissive),
            DoorType::Invalid
        );

        let empty = GeometryBundle::default();
        assert_eq!(
            classify_door(&empty, PolygonVertexTolerance::Permissive),
            DoorType::Invalid
        );
        assert!(resolve_threshold_line(&empty, DoorType::Invalid).is_none());
    }

    #[test]
    fn short_rings_and_polylines_resolve_to_none() {
        let thin = GeometryBundle::new(
            vec![PolygonContainer::new(vec![vec![p(0.0, 0.0), p(1.0, 0.0)]])],
            vec![],
        );
        assert_eq!(
            classify_door(&thin, PolygonVertexTolerance::Permissive),
            DoorType::TypeB
        );
        assert!(resolve_threshold_line(&thin, DoorType::TypeB).is_none());

        let no_rings = GeometryBundle::new(vec![PolygonContainer::default()], vec![]);
        assert!(resolve_threshold_line(&no_rings, DoorType::TypeB).is_none());

        // 4 个多段线顶点，但第二条只有一个点
        let lopsided = GeometryBundle::new(
            vec![PolygonContainer::new(vec![rectangle()])],
            vec![vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)], vec![p(3.0, 0.0)]],
        );
        assert_eq!(
            classify_door(&lopsided, PolygonVertexTolerance::Strict),
            DoorType::TypeA
        );
        assert!(resolve_threshold_line(&lopsided, DoorType::TypeA).is_none());
    }
}
