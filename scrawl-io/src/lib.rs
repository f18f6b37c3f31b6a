use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, trace};

use scrawl_core::{
    geometry::Point2,
    scene::OutputScene,
    source::{GeometryBundle, Layer, PolygonContainer, SourceDocument},
};

/// 输出文件扩展名（含前导点）。
pub const OUTPUT_EXTENSION: &str = ".dd2vtt";

static MAP_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"map(\{.*\})").expect("map pattern is a valid regex"));

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no embedded `map{{...}}` document found in source text")]
    MapDataNotFound,
    #[error("embedded map document is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum IoError {
    #[error("input file {path:?} not found")]
    InputNotFound { path: PathBuf },
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("invalid document structure at {context}: {source}")]
    Schema {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize scene: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl IoError {
    fn schema(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Schema {
            context: context.into(),
            source,
        }
    }
}

pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<SourceDocument, IoError>;
}

pub trait SceneSaver {
    fn save(&self, scene: &OutputScene, path: &Path) -> Result<(), IoError>;
}

/// DungeonScrawl 导出文件的读取与 `.dd2vtt` 场景写出入口。
pub struct ScrawlFacade;

impl ScrawlFacade {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ScrawlFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for ScrawlFacade {
    fn load(&self, path: &Path) -> Result<SourceDocument, IoError> {
        let bytes = read_bytes(path)?;
        let text = decode_lossy(&bytes);
        debug!(
            path = %path.display(),
            bytes = bytes.len(),
            decoded = text.len(),
            "读取源文件完成"
        );
        ScrawlParser::new(&text).parse()
    }
}

impl SceneSaver for ScrawlFacade {
    fn save(&self, scene: &OutputScene, path: &Path) -> Result<(), IoError> {
        let content = scene_to_string(scene)?;
        write_atomically(path, content.as_bytes())
    }
}

/// 解析源文本中嵌入的 `map{...}` JSON 文档。
pub fn parse_source(text: &str) -> Result<SourceDocument, IoError> {
    ScrawlParser::new(text).parse()
}

/// 按 UTF-8 解码，丢弃无法解码的字节而不是报错。
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

/// 以 4 空格缩进序列化场景，字段顺序与结构体声明一致。
pub fn scene_to_string(scene: &OutputScene) -> Result<String, IoError> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    scene.serialize(&mut serializer).map_err(IoError::Serialize)?;
    // serde_json 只会输出合法 UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// 读取任意二进制文件并编码为标准 base64（不含换行）。
pub fn encode_image(path: &Path) -> Result<String, IoError> {
    let bytes = read_bytes(path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "嵌入背景图片");
    Ok(STANDARD.encode(bytes))
}

/// 将源路径的最后三个字符替换为 `.dd2vtt`。
pub fn default_output_path(source: &Path) -> PathBuf {
    let raw = source.to_string_lossy();
    let keep = raw.chars().count().saturating_sub(3);
    let mut name: String = raw.chars().take(keep).collect();
    name.push_str(OUTPUT_EXTENSION);
    PathBuf::from(name)
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, IoError> {
    fs::read(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            IoError::InputNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IoError::ReadError {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

/// 先写入同目录临时文件再重命名，失败时不留下截断的目标文件。
fn write_atomically(path: &Path, content: &[u8]) -> Result<(), IoError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scene".to_string());
    let temp_path = path.with_file_name(format!(".{file_name}.partial"));

    let write_error = |source| IoError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    if let Err(source) = fs::write(&temp_path, content) {
        let _ = fs::remove_file(&temp_path);
        return Err(write_error(source));
    }
    if let Err(source) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(write_error(source));
    }
    debug!(path = %path.display(), bytes = content.len(), "场景文件已写出");
    Ok(())
}

#[derive(Debug, Deserialize)]
struct RawExport {
    state: RawState,
    data: RawData,
}

#[derive(Debug, Deserialize)]
struct RawState {
    document: RawDocument,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    nodes: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawData {
    geometry: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "geometryId", default)]
    geometry_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    polygons: Vec<Vec<Vec<[f64; 2]>>>,
    polylines: Vec<Vec<[f64; 2]>>,
}

impl From<RawGeometry> for GeometryBundle {
    fn from(raw: RawGeometry) -> Self {
        let polygons = raw
            .polygons
            .into_iter()
            .map(|rings| {
                PolygonContainer::new(
                    rings
                        .into_iter()
                        .map(|ring| ring.into_iter().map(Point2::from).collect())
                        .collect(),
                )
            })
            .collect();
        let polylines = raw
            .polylines
            .into_iter()
            .map(|line| line.into_iter().map(Point2::from).collect())
            .collect();
        GeometryBundle::new(polygons, polylines)
    }
}

struct ScrawlParser<'a> {
    source: &'a str,
}

impl<'a> ScrawlParser<'a> {
    fn new(source: &'a str) -> Self {
        Self { source }
    }

    fn parse(self) -> Result<SourceDocument, IoError> {
        let embedded = self.embedded_json()?;
        let value: Value = serde_json::from_str(embedded).map_err(ParseError::InvalidJson)?;
        let raw: RawExport =
            serde_json::from_value(value).map_err(|err| IoError::schema("document root", err))?;

        let mut document = SourceDocument::new();
        for (id, node) in raw.state.document.nodes {
            let node: RawNode = serde_json::from_value(node)
                .map_err(|err| IoError::schema(format!("state.document.nodes.{id}"), err))?;
            trace!(layer = %id, kind = %node.kind, name = %node.name, "解析图层节点");
            document.add_layer(Layer::new(id, node.kind, node.name, node.geometry_id));
        }

        // 几何条目只在被图层引用时才要求结构合法
        for (id, entry) in raw.data.geometry {
            match serde_json::from_value::<RawGeometry>(entry) {
                Ok(geometry) => document.insert_geometry(id, geometry.into()),
                Err(err) => {
                    debug!(geometry = %id, error = %err, "几何条目结构不合法，暂不处理");
                    document.insert_malformed(id, err.to_string());
                }
            }
        }

        debug!(
            layers = document.layers().count(),
            geometry = document.geometry_count(),
            "源文档解析完成"
        );
        Ok(document)
    }

    fn embedded_json(&self) -> Result<&'a str, ParseError> {
        MAP_PATTERN
            .captures(self.source)
            .and_then(|captures| captures.get(1))
            .map(|capture| capture.as_str())
            .ok_or(ParseError::MapDataNotFound)
    }
}
