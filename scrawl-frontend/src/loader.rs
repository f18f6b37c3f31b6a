use std::path::PathBuf;

use scrawl_config::{ConversionConfig, DoorNameMatch, DoorPolygonTolerance};
use scrawl_engine::assemble::SceneSettings;
use scrawl_engine::door::PolygonVertexTolerance;
use scrawl_engine::layers::DoorNameRule;
use scrawl_engine::{ConversionOptions, ConversionReport, convert};
use scrawl_io::{DocumentLoader, SceneSaver, ScrawlFacade, encode_image};
use tracing::info;

use crate::errors::FrontendError;

/// 一次文件到文件转换所需的全部输入。
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub source: PathBuf,
    pub output: PathBuf,
    pub image: Option<PathBuf>,
    pub settings: SceneSettings,
    pub options: ConversionOptions,
}

#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub output: PathBuf,
    pub report: ConversionReport,
}

pub fn options_from_config(config: &ConversionConfig) -> ConversionOptions {
    ConversionOptions {
        door_name_rule: match config.door_name_match {
            DoorNameMatch::Exact => DoorNameRule::Exact,
            DoorNameMatch::Prefix => DoorNameRule::Prefix,
        },
        door_tolerance: match config.door_polygon_tolerance {
            DoorPolygonTolerance::Strict => PolygonVertexTolerance::Strict,
            DoorPolygonTolerance::Permissive => PolygonVertexTolerance::Permissive,
        },
        units_per_cell: config.source_units_per_cell,
    }
}

/// 读取源文件、嵌入图片、转换并写出场景。任何一步失败都不会产生输出文件。
pub fn convert_file(request: &ConversionRequest) -> Result<ConversionOutcome, FrontendError> {
    if request.settings.pixels_per_grid == 0 {
        return Err(FrontendError::InvalidTileSize);
    }

    let facade = ScrawlFacade::new();
    let document = facade.load(&request.source)?;
    info!(path = %request.source.display(), "源文档加载成功");

    let image = request.image.as_deref().map(encode_image).transpose()?;

    let conversion = convert(&document, request.options, &request.settings, image)?;
    facade.save(&conversion.scene, &request.output)?;
    info!(path = %request.output.display(), "场景已写出");

    Ok(ConversionOutcome {
        output: request.output.clone(),
        report: conversion.report,
    })
}
