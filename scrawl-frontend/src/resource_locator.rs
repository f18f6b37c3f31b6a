use std::env;
use std::path::{Path, PathBuf};

use scrawl_config::AppConfig;
use tracing::{debug, trace};

pub const IMAGE_ROOTS_ENV: &str = "SCRAWL_VTT_IMAGE_ROOTS";

/// 为 `--image` 参数查找背景图片。
pub struct ImageLocator {
    search_roots: Vec<PathBuf>,
}

impl ImageLocator {
    pub fn from_config(base_dir: Option<&Path>, config: &AppConfig) -> Self {
        let mut roots: Vec<PathBuf> = Vec::new();

        if let Some(dir) = base_dir {
            roots.push(dir.to_path_buf());
        }

        roots.extend(
            config
                .resources
                .image_roots
                .iter()
                .cloned()
                .filter(|path| path.is_dir()),
        );

        if let Some(env_paths) = env::var_os(IMAGE_ROOTS_ENV) {
            for path in env::split_paths(&env_paths) {
                if path.is_dir() {
                    roots.push(path);
                }
            }
        }

        // 去重，保持靠前优先级。
        let mut deduped: Vec<PathBuf> = Vec::new();
        for root in roots {
            if !deduped.iter().any(|existing| existing == &root) {
                deduped.push(root);
            }
        }

        ImageLocator {
            search_roots: deduped,
        }
    }

    /// 先按原样（相对当前目录或绝对路径）查找，再依次尝试各搜索根目录。
    pub fn resolve(&self, raw_path: &Path) -> Option<PathBuf> {
        if raw_path.exists() {
            return Some(raw_path.to_path_buf());
        }
        if raw_path.is_absolute() {
            debug!(path = %raw_path.display(), "图片路径为绝对路径但未找到对应文件");
            return None;
        }

        for root in &self.search_roots {
            let candidate = root.join(raw_path);
            trace!(candidate = %candidate.display(), "image locator candidate");
            if candidate.exists() {
                return Some(candidate);
            }
        }
        None
    }
}
