//! 图片读取与 Base64 编码

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, warn};

/// 把前端传来的各种形式的图片引用归一化成磁盘路径
///
/// 支持 `/uploads/xx`、`uploads/xx`、绝对路径，以及被当作
/// uploads 目录下文件名的裸相对路径。
pub fn resolve_image_path(base_dir: &Path, image_path: &str) -> PathBuf {
    if let Some(rest) = image_path.strip_prefix("/uploads/") {
        base_dir.join("uploads").join(rest)
    } else if image_path.starts_with("uploads/") {
        base_dir.join(image_path)
    } else if Path::new(image_path).is_absolute() {
        PathBuf::from(image_path)
    } else {
        base_dir.join("uploads").join(image_path)
    }
}

fn mime_for_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

/// 读取图片并编码成 data URL
///
/// 文件不存在或读取失败返回 None，调用方跳过这张图继续。
pub async fn load_image_data_url(base_dir: &Path, image_path: &str) -> Option<String> {
    let full_path = resolve_image_path(base_dir, image_path);
    debug!("处理图片路径: {} -> {}", image_path, full_path.display());

    let bytes = match tokio::fs::read(&full_path).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("图片文件读取失败 {}: {}", full_path.display(), err);
            return None;
        }
    };

    let mime = mime_for_extension(&full_path);
    let encoded = STANDARD.encode(&bytes);
    debug!(
        "图片转换成功，格式: {}, Base64长度: {}",
        mime,
        encoded.len()
    );

    Some(format!("data:{};base64,{}", mime, encoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_image_path_variants() {
        let base = Path::new("/srv/collector");

        assert_eq!(
            resolve_image_path(base, "/uploads/a.jpg"),
            PathBuf::from("/srv/collector/uploads/a.jpg")
        );
        assert_eq!(
            resolve_image_path(base, "uploads/a.jpg"),
            PathBuf::from("/srv/collector/uploads/a.jpg")
        );
        assert_eq!(
            resolve_image_path(base, "/tmp/b.png"),
            PathBuf::from("/tmp/b.png")
        );
        assert_eq!(
            resolve_image_path(base, "c.webp"),
            PathBuf::from("/srv/collector/uploads/c.webp")
        );
    }

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for_extension(Path::new("a.PNG")), "image/png");
        assert_eq!(mime_for_extension(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(mime_for_extension(Path::new("a.webp")), "image/webp");
        // 未知扩展名按 jpeg 处理
        assert_eq!(mime_for_extension(Path::new("a.bin")), "image/jpeg");
    }
}
