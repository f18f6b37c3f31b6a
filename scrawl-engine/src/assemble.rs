use scrawl_core::scene::{
    Environment, FORMAT_VERSION, GridPoint, MapSize, ObstructionLine, OutputScene, Portal,
    Resolution,
};

/// 由调用方给出的场景尺寸信息，原样写入输出。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneSettings {
    pub map_size: MapSize,
    pub pixels_per_grid: u32,
}

impl SceneSettings {
    pub fn new(width: u32, height: u32, pixels_per_grid: u32) -> Self {
        Self {
            map_size: MapSize {
                x: width,
                y: height,
            },
            pixels_per_grid,
        }
    }
}

pub fn assemble_scene(
    settings: &SceneSettings,
    line_of_sight: Vec<ObstructionLine>,
    portals: Vec<Portal>,
    image: Option<String>,
) -> OutputScene {
    OutputScene {
        format: FORMAT_VERSION,
        resolution: Resolution {
            map_origin: GridPoint::new(0.0, 0.0),
            map_size: settings.map_size,
            pixels_per_grid: settings.pixels_per_grid,
        },
        line_of_sight,
        objects_line_of_sight: Vec::new(),
        portals,
        environment: Environment::default(),
        lights: Vec::new(),
        image: image.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_is_copied_verbatim() {
        let settings = SceneSettings::new(20, 15, 70);
        let scene = assemble_scene(&settings, Vec::new(), Vec::new(), None);
        assert_eq!(scene.format, 0.3);
        assert_eq!(scene.resolution.map_origin, GridPoint::new(0.0, 0.0));
        assert_eq!(scene.resolution.map_size, MapSize { x: 20, y: 15 });
        assert_eq!(scene.resolution.pixels_per_grid, 70);
        assert!(scene.objects_line_of_sight.is_empty());
        assert!(scene.lights.is_empty());
        assert!(scene.environment.baked_lighting);
        assert_eq!(scene.environment.ambient_light, "ffffffff");
        assert_eq!(scene.image, "");
    }

    #[test]
    fn image_is_embedded_when_present() {
        let settings = SceneSettings::new(1, 1, 100);
        let scene = assemble_scene(&settings, Vec::new(), Vec::new(), Some("aGVsbG8=".into()));
        assert_eq!(scene.image, "aGVsbG8=");
    }
}
