//! 产品业务服务

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::image::resolve_image_path;
use crate::app::products::model::{ProductRecord, SaveProductRequest};
use crate::infrastructure::store::{ProductStore, StoreError};

#[derive(Clone)]
pub struct ProductService {
    store: Arc<ProductStore>,
    base_dir: PathBuf,
}

impl ProductService {
    pub fn new(store: Arc<ProductStore>, base_dir: PathBuf) -> Self {
        Self { store, base_dir }
    }

    /// 保存一条新记录，返回分配的序列号和 id
    ///
    /// 名称校验在处理器层完成，这里假定 name 已非空。
    pub async fn save(&self, req: SaveProductRequest) -> Result<ProductRecord, StoreError> {
        let mut products = self.store.read_all().await?;

        let today = Utc::now().format("%Y%m%d").to_string();
        let serial_number = next_serial_number(&products, &today);
        let now = Utc::now().to_rfc3339();

        let trimmed = |value: Option<String>| {
            value.map(|v| v.trim().to_string()).unwrap_or_default()
        };

        let record = ProductRecord {
            id: Uuid::new_v4(),
            serial_number,
            name: req.name.trim().to_string(),
            brand: trimmed(req.brand),
            price: trimmed(req.price),
            barcode: trimmed(req.barcode),
            description: trimmed(req.description),
            image_paths: req.image_paths.unwrap_or_default(),
            created_at: now.clone(),
            updated_at: now,
        };

        products.push(record.clone());
        self.store.write_all(&products).await?;

        info!("产品保存成功: {}", record.serial_number);
        Ok(record)
    }

    /// 全部记录，按创建时间倒序
    pub async fn list(&self) -> Result<Vec<ProductRecord>, StoreError> {
        let mut products = self.store.read_all().await?;
        products.sort_by_key(|p| std::cmp::Reverse(created_at_millis(p)));
        Ok(products)
    }

    /// 按 id 删除记录，并清理它引用的图片文件
    ///
    /// 返回 Ok(None) 表示记录不存在。图片文件删除失败只记日志，
    /// 记录本身的删除已经生效。
    pub async fn delete(&self, id: Uuid) -> Result<Option<ProductRecord>, StoreError> {
        let mut products = self.store.read_all().await?;

        let Some(index) = products.iter().position(|p| p.id == id) else {
            return Ok(None);
        };

        let removed = products.remove(index);
        self.store.write_all(&products).await?;

        for image_path in &removed.image_paths {
            let full_path = resolve_image_path(&self.base_dir, image_path);
            if let Err(err) = tokio::fs::remove_file(&full_path).await {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!("删除图片文件失败 {}: {}", full_path.display(), err);
                }
            }
        }

        info!("产品删除成功: {}", removed.serial_number);
        Ok(Some(removed))
    }
}

/// 当天的下一个序列号：取当天已有序列号的最大序号加一
///
/// 不用"当天记录数加一"，否则删除过记录的当天再保存会撞号。
pub fn next_serial_number(products: &[ProductRecord], today: &str) -> String {
    let max_seq = products
        .iter()
        .filter_map(|p| p.serial_number.strip_prefix(today))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .unwrap_or(0);

    format!("{}{:03}", today, max_seq + 1)
}

fn created_at_millis(record: &ProductRecord) -> i64 {
    chrono::DateTime::parse_from_rfc3339(&record.created_at)
        .map(|t| t.timestamp_millis())
        .unwrap_or(0)
}
