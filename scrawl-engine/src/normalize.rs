use scrawl_core::geometry::{Point2, Vector2};
use scrawl_core::scene::{GridPoint, ObstructionLine};

/// 源图单位到网格单元的换算：36 个源单位 = 1 格。
pub const DEFAULT_UNITS_PER_CELL: f64 = 36.0;

/// 单次转换内观察到的最小 (x, y)。只会单调下降。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OriginOffset {
    min: Option<Point2>,
}

impl OriginOffset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, point: Point2) {
        self.min = Some(match self.min {
            None => point,
            Some(current) => Point2::from_vec(current.as_vec2().min(point.as_vec2())),
        });
    }

    pub fn observe_all<'a>(&mut self, points: impl IntoIterator<Item = &'a Point2>) {
        for point in points {
            self.observe(*point);
        }
    }

    #[inline]
    pub fn value(&self) -> Option<Point2> {
        self.min
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.is_none()
    }

    /// 冻结偏移量并生成换算器。尚未观察到任何点时偏移视为原点。
    pub fn normalizer(&self, scale: f64) -> Normalizer {
        let origin = self.min.unwrap_or(Point2::new(0.0, 0.0));
        Normalizer {
            shift: Vector2::from_points(origin, Point2::new(0.0, 0.0)),
            scale,
        }
    }
}

/// `(p - offset) * scale`。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    shift: Vector2,
    scale: f64,
}

impl Normalizer {
    #[inline]
    pub fn apply(&self, point: Point2) -> Point2 {
        Point2::from_vec(point.translate(self.shift).as_vec2() * self.scale)
    }

    pub fn apply_line(&self, points: &[Point2]) -> ObstructionLine {
        points
            .iter()
            .map(|point| GridPoint::from(self.apply(*point)))
            .collect()
    }

    pub fn apply_lines(&self, lines: &[Vec<Point2>]) -> Vec<ObstructionLine> {
        lines.iter().map(|line| self.apply_line(line)).collect()
    }
}
