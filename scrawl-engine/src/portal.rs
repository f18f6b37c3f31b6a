use scrawl_core::scene::{GridPoint, Portal};

use crate::door::ThresholdLine;

/// 由已归一化的门槛线生成门户：中点定位，端点 0 指向端点 1 的方向角作为旋转。
pub fn build_portal(line: &ThresholdLine) -> Portal {
    let [start, end] = *line;
    Portal {
        position: start.midpoint(end).into(),
        bounds: vec![GridPoint::from(start), GridPoint::from(end)],
        rotation: start.vector_to(end).angle(),
        closed: true,
        freestanding: false,
    }
}

pub fn build_portals(lines: &[ThresholdLine]) -> Vec<Portal> {
    lines.iter().map(build_portal).collect()
}
