use scrawl_core::source::{Layer, SourceDocument};
use tracing::trace;

pub const DOOR_LAYER_NAME: &str = "Door geometry";
pub const DOOR_LAYER_PREFIX: &str = "Door";
pub const STAIRS_LAYER_NAME: &str = "Stairs geometry";

/// 判定门图层名称的规则。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DoorNameRule {
    /// 名称必须等于 `Door geometry`。
    Exact,
    /// 名称以 `Door` 开头即可。
    #[default]
    Prefix,
}

impl DoorNameRule {
    #[inline]
    pub fn matches(self, name: &str) -> bool {
        match self {
            DoorNameRule::Exact => name == DOOR_LAYER_NAME,
            DoorNameRule::Prefix => name.starts_with(DOOR_LAYER_PREFIX),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerRole {
    Wall,
    Door,
    Stairs,
    Other,
}

/// 按类型与名称为单个图层分配角色。没有几何引用的图层一律视为 `Other`。
pub fn classify_layer(layer: &Layer, rule: DoorNameRule) -> LayerRole {
    if layer.geometry_reference().is_none() {
        return LayerRole::Other;
    }
    if layer.name == STAIRS_LAYER_NAME {
        LayerRole::Stairs
    } else if rule.matches(&layer.name) {
        LayerRole::Door
    } else {
        LayerRole::Wall
    }
}

/// 墙体与门两个桶中的几何 ID，保持文档顺序。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeometryIds {
    pub walls: Vec<String>,
    pub doors: Vec<String>,
}

pub fn collect_geometry_ids(document: &SourceDocument, rule: DoorNameRule) -> GeometryIds {
    let mut ids = GeometryIds::default();
    for layer in document.layers() {
        let role = classify_layer(layer, rule);
        trace!(layer = %layer.id, name = %layer.name, ?role, "图层分类");
        let Some(geometry_id) = layer.geometry_reference() else {
            continue;
        };
        match role {
            LayerRole::Wall => ids.walls.push(geometry_id.to_string()),
            LayerRole::Door => ids.doors.push(geometry_id.to_string()),
            LayerRole::Stairs | LayerRole::Other => {}
        }
    }
    ids
}
