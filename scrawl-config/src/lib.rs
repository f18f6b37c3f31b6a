use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 指定配置文件路径的环境变量。
pub const CONFIG_ENV: &str = "SCRAWL_VTT_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
    #[serde(default)]
    pub resources: ResourceConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `SCRAWL_VTT_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorNameMatch {
    Exact,
    #[default]
    Prefix,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorPolygonTolerance {
    Strict,
    #[default]
    Permissive,
}

/// 转换流程的默认参数。
#[derive(Debug, Clone, Deserialize)]
pub struct ConversionConfig {
    #[serde(default = "ConversionConfig::default_tile_size")]
    pub default_tile_size: u32,
    #[serde(default = "ConversionConfig::default_units_per_cell")]
    pub source_units_per_cell: f64,
    #[serde(default)]
    pub door_name_match: DoorNameMatch,
    #[serde(default)]
    pub door_polygon_tolerance: DoorPolygonTolerance,
}

impl ConversionConfig {
    fn default_tile_size() -> u32 {
        70
    }

    fn default_units_per_cell() -> f64 {
        36.0
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            default_tile_size: Self::default_tile_size(),
            source_units_per_cell: Self::default_units_per_cell(),
            door_name_match: DoorNameMatch::default(),
            door_polygon_tolerance: DoorPolygonTolerance::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub image_roots: Vec<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_builtin_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.conversion.default_tile_size, 70);
        assert!((cfg.conversion.source_units_per_cell - 36.0).abs() < f64::EPSILON);
        assert_eq!(cfg.conversion.door_name_match, DoorNameMatch::Prefix);
        assert_eq!(
            cfg.conversion.door_polygon_tolerance,
            DoorPolygonTolerance::Permissive
        );
        assert!(cfg.resources.image_roots.is_empty());
    }

    #[test]
    fn load_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r#"
            [logging]
            level = "debug"

            [conversion]
            default_tile_size = 100
            door_name_match = "exact"
            door_polygon_tolerance = "strict"

            [resources]
            image_roots = ["../renders", "../exports"]
            "#
        )
        .unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.conversion.default_tile_size, 100);
        assert!((cfg.conversion.source_units_per_cell - 36.0).abs() < f64::EPSILON);
        assert_eq!(cfg.conversion.door_name_match, DoorNameMatch::Exact);
        assert_eq!(
            cfg.conversion.door_polygon_tolerance,
            DoorPolygonTolerance::Strict
        );
        assert_eq!(cfg.resources.image_roots.len(), 2);
    }

    #[test]
    fn partial_file_keeps_section_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[conversion]\nsource_units_per_cell = 72.0").unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.conversion.default_tile_size, 70);
        assert!((cfg.conversion.source_units_per_cell - 72.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_toml_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[conversion\ndefault_tile_size = ").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_reports_io_error() {
        let err = AppConfig::from_file("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
