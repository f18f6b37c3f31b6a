pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，源图坐标与网格坐标共用。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn vector_to(self, other: Point2) -> Vector2 {
            Vector2(other.0 - self.0)
        }

        /// 两点的算术中点。
        #[inline]
        pub fn midpoint(self, other: Point2) -> Self {
            Self((self.0 + other.0) * 0.5)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    impl From<[f64; 2]> for Point2 {
        fn from(value: [f64; 2]) -> Self {
            Self::new(value[0], value[1])
        }
    }

    /// 二维向量。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_points(start: Point2, end: Point2) -> Self {
            Self(end.0 - start.0)
        }

        #[inline]
        pub fn length_squared(self) -> f64 {
            self.0.length_squared()
        }

        #[inline]
        pub fn scale(self, factor: f64) -> Self {
            Self(self.0 * factor)
        }

        /// 相对 +X 轴的方向角（弧度），取值范围 (-π, π]。
        #[inline]
        pub fn angle(self) -> f64 {
            self.0.y.atan2(self.0.x)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 轴对齐边界框，用于统计输出几何的范围。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }
    }

    impl Default for Bounds2D {
        fn default() -> Self {
            Self::empty()
        }
    }
}

pub mod source {
    use std::collections::HashMap;

    use serde::{Deserialize, Serialize};

    use crate::geometry::Point2;

    /// 几何图层的类型标记。
    pub const GEOMETRY_KIND: &str = "GEOMETRY";

    /// 源文档中的一个图层节点。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Layer {
        pub id: String,
        pub kind: String,
        pub name: String,
        pub geometry_id: Option<String>,
    }

    impl Layer {
        pub fn new(
            id: impl Into<String>,
            kind: impl Into<String>,
            name: impl Into<String>,
            geometry_id: Option<String>,
        ) -> Self {
            Self {
                id: id.into(),
                kind: kind.into(),
                name: name.into(),
                geometry_id,
            }
        }

        /// 仅当类型为 `GEOMETRY` 且带有几何引用时才参与分类。
        #[inline]
        pub fn geometry_reference(&self) -> Option<&str> {
            if self.kind == GEOMETRY_KIND {
                self.geometry_id.as_deref()
            } else {
                None
            }
        }
    }

    pub type Polyline = Vec<Point2>;

    /// 多边形容器：一组闭合环（第一个为外环，其余可能是孔）。
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct PolygonContainer {
        pub rings: Vec<Vec<Point2>>,
    }

    impl PolygonContainer {
        pub fn new(rings: Vec<Vec<Point2>>) -> Self {
            Self { rings }
        }

        /// 所有环的顶点总数。
        pub fn vertex_count(&self) -> usize {
            self.rings.iter().map(Vec::len).sum()
        }

        #[inline]
        pub fn first_ring(&self) -> Option<&[Point2]> {
            self.rings.first().map(Vec::as_slice)
        }
    }

    /// 单个几何 ID 对应的多边形与多段线集合。
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct GeometryBundle {
        pub polygons: Vec<PolygonContainer>,
        pub polylines: Vec<Polyline>,
    }

    impl GeometryBundle {
        pub fn new(polygons: Vec<PolygonContainer>, polylines: Vec<Polyline>) -> Self {
            Self {
                polygons,
                polylines,
            }
        }

        pub fn polyline_vertex_count(&self) -> usize {
            self.polylines.iter().map(Vec::len).sum()
        }
    }

    /// 解析后的源文档：按文档顺序保存图层，并以 ID 索引几何表。
    #[derive(Debug, Clone, Default)]
    pub struct SourceDocument {
        layers: Vec<Layer>,
        geometry: HashMap<String, GeometryBundle>,
        malformed: HashMap<String, String>,
    }

    impl SourceDocument {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_layer(&mut self, layer: Layer) {
            self.layers.push(layer);
        }

        pub fn insert_geometry(&mut self, id: impl Into<String>, bundle: GeometryBundle) {
            self.geometry.insert(id.into(), bundle);
        }

        /// 记录一条结构不合法的几何条目；只有被图层引用时才会成为错误。
        pub fn insert_malformed(&mut self, id: impl Into<String>, reason: impl Into<String>) {
            self.malformed.insert(id.into(), reason.into());
        }

        pub fn layers(&self) -> impl Iterator<Item = &Layer> {
            self.layers.iter()
        }

        #[inline]
        pub fn geometry(&self, id: &str) -> Option<&GeometryBundle> {
            self.geometry.get(id)
        }

        #[inline]
        pub fn malformed_geometry(&self, id: &str) -> Option<&str> {
            self.malformed.get(id).map(String::as_str)
        }

        pub fn geometry_count(&self) -> usize {
            self.geometry.len()
        }
    }
}

pub mod scene {
    use serde::{Deserialize, Serialize};

    use crate::geometry::Point2;

    pub const FORMAT_VERSION: f64 = 0.3;
    pub const DEFAULT_AMBIENT_LIGHT: &str = "ffffffff";

    /// 输出场景中的坐标，序列化为 `{"x": .., "y": ..}`。
    #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
    pub struct GridPoint {
        pub x: f64,
        pub y: f64,
    }

    impl GridPoint {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self { x, y }
        }
    }

    impl From<Point2> for GridPoint {
        fn from(value: Point2) -> Self {
            Self::new(value.x(), value.y())
        }
    }

    impl From<GridPoint> for Point2 {
        fn from(value: GridPoint) -> Self {
            Point2::new(value.x, value.y)
        }
    }

    /// 一条阻挡视线的折线，至少两个点。
    pub type ObstructionLine = Vec<GridPoint>;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Portal {
        pub position: GridPoint,
        pub bounds: Vec<GridPoint>,
        pub rotation: f64,
        pub closed: bool,
        pub freestanding: bool,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MapSize {
        pub x: u32,
        pub y: u32,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Resolution {
        pub map_origin: GridPoint,
        pub map_size: MapSize,
        pub pixels_per_grid: u32,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Environment {
        pub baked_lighting: bool,
        pub ambient_light: String,
    }

    impl Default for Environment {
        fn default() -> Self {
            Self {
                baked_lighting: true,
                ambient_light: DEFAULT_AMBIENT_LIGHT.to_string(),
            }
        }
    }

    /// 点光源。转换流程不会生成光源，但保留类型以便读取其他工具导出的场景。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Light {
        pub position: GridPoint,
        pub range: f64,
        pub intensity: f64,
        pub color: String,
        pub shadows: bool,
    }

    /// 最终写出的 `.dd2vtt` 场景。字段顺序即序列化顺序。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct OutputScene {
        pub format: f64,
        pub resolution: Resolution,
        pub line_of_sight: Vec<ObstructionLine>,
        pub objects_line_of_sight: Vec<ObstructionLine>,
        pub portals: Vec<Portal>,
        pub environment: Environment,
        pub lights: Vec<Light>,
        pub image: String,
    }
}

#[cfg(test)]
mod tests {
    use super::geometry::{Bounds2D, Point2, Vector2};
    use super::scene::{Environment, FORMAT_VERSION, GridPoint, MapSize, OutputScene, Resolution};
    use super::source::{GeometryBundle, Layer, PolygonContainer, SourceDocument};
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn vector_angle_follows_atan2() {
        assert!(Vector2::new(1.0, 0.0).angle().abs() < 1e-12);
        assert!((Vector2::new(0.0, 1.0).angle() - FRAC_PI_2).abs() < 1e-12);
        let from = Point2::new(2.0, 2.0);
        let to = Point2::new(2.0, 5.0);
        assert!((from.vector_to(to).angle() - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn bounds_track_extremes() {
        let mut bounds = Bounds2D::empty();
        assert!(bounds.is_empty());
        bounds.include_point(Point2::new(3.0, -1.0));
        bounds.include_point(Point2::new(-2.0, 4.0));
        assert!(!bounds.is_empty());
        assert_eq!(bounds.min(), Point2::new(-2.0, -1.0));
        assert_eq!(bounds.max(), Point2::new(3.0, 4.0));
    }

    #[test]
    fn geometry_reference_requires_geometry_kind() {
        let geometry = Layer::new("a", "GEOMETRY", "Walls", Some("g1".to_string()));
        let folder = Layer::new("b", "FOLDER", "Walls", Some("g2".to_string()));
        let bare = Layer::new("c", "GEOMETRY", "Walls", None);
        assert_eq!(geometry.geometry_reference(), Some("g1"));
        assert_eq!(folder.geometry_reference(), None);
        assert_eq!(bare.geometry_reference(), None);
    }

    #[test]
    fn bundle_counts_vertices() {
        let container = PolygonContainer::new(vec![
            vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(1.0, 1.0)],
            vec![Point2::new(0.2, 0.2), Point2::new(0.4, 0.2)],
        ]);
        assert_eq!(container.vertex_count(), 5);
        assert_eq!(container.first_ring().map(<[Point2]>::len), Some(3));

        let bundle = GeometryBundle::new(
            vec![container],
            vec![vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)]],
        );
        assert_eq!(bundle.polyline_vertex_count(), 2);

        let mut doc = SourceDocument::new();
        doc.insert_geometry("g1", bundle);
        assert!(doc.geometry("g1").is_some());
        assert!(doc.geometry("missing").is_none());

        doc.insert_malformed("g2", "missing field `polylines`");
        assert!(doc.geometry("g2").is_none());
        assert_eq!(doc.malformed_geometry("g2"), Some("missing field `polylines`"));
        assert_eq!(doc.malformed_geometry("g1"), None);
        assert_eq!(doc.geometry_count(), 1);
    }

    #[test]
    fn output_scene_serializes_fields_in_order() {
        let scene = OutputScene {
            format: FORMAT_VERSION,
            resolution: Resolution {
                map_origin: GridPoint::default(),
                map_size: MapSize { x: 3, y: 2 },
                pixels_per_grid: 70,
            },
            line_of_sight: vec![vec![GridPoint::new(0.0, 0.0), GridPoint::new(1.0, 0.0)]],
            objects_line_of_sight: Vec::new(),
            portals: Vec::new(),
            environment: Environment::default(),
            lights: Vec::new(),
            image: String::new(),
        };
        let json = serde_json::to_string(&scene).expect("serialize scene");
        let keys = [
            "\"format\"",
            "\"resolution\"",
            "\"line_of_sight\"",
            "\"objects_line_of_sight\"",
            "\"portals\"",
            "\"environment\"",
            "\"lights\"",
            "\"image\"",
        ];
        let positions: Vec<usize> = keys
            .iter()
            .map(|key| json.find(key).expect("key present"))
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(json.contains("\"ambient_light\":\"ffffffff\""));
        assert!(json.contains("\"map_size\":{\"x\":3,\"y\":2}"));
    }
}
