//! Excel 导出
//!
//! 固定列宽和中文表头，与既有导出文件保持同样的版式。

use rust_xlsxwriter::{Workbook, XlsxError};

use crate::app::products::model::ProductRecord;

const HEADERS: [&str; 9] = [
    "序号",
    "产品序列号",
    "产品名称",
    "品牌",
    "价格",
    "条形码",
    "描述",
    "图片数量",
    "创建时间",
];

const COLUMN_WIDTHS: [f64; 9] = [8.0, 15.0, 25.0, 15.0, 12.0, 18.0, 30.0, 10.0, 20.0];

/// 把全部记录写成一个 xlsx 文件的字节串
pub fn build_workbook(products: &[ProductRecord]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("产品列表")?;

    for (col, (header, width)) in HEADERS.iter().zip(COLUMN_WIDTHS).enumerate() {
        let col = col as u16;
        sheet.set_column_width(col, width)?;
        sheet.write_string(0, col, *header)?;
    }

    for (index, product) in products.iter().enumerate() {
        let row = index as u32 + 1;
        sheet.write_number(row, 0, (index + 1) as f64)?;
        sheet.write_string(row, 1, product.serial_number.as_str())?;
        sheet.write_string(row, 2, product.name.as_str())?;
        sheet.write_string(row, 3, product.brand.as_str())?;
        sheet.write_string(row, 4, product.price.as_str())?;
        sheet.write_string(row, 5, product.barcode.as_str())?;
        sheet.write_string(row, 6, product.description.as_str())?;
        sheet.write_number(row, 7, product.image_paths.len() as f64)?;
        sheet.write_string(row, 8, format_created_at(&product.created_at))?;
    }

    workbook.save_to_buffer()
}

/// 导出文件名，日期后缀
pub fn export_filename() -> String {
    format!("产品列表_{}.xlsx", chrono::Utc::now().format("%Y-%m-%d"))
}

/// Content-Disposition 里的文件名需要百分号编码非 ASCII 字节
pub fn percent_encode(input: &str) -> String {
    let mut encoded = String::new();
    for byte in input.bytes() {
        match byte {
            b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            other => encoded.push_str(&format!("%{:02X}", other)),
        }
    }
    encoded
}

fn format_created_at(created_at: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(created_at)
        .map(|t| t.format("%Y/%m/%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| created_at.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_build_workbook_produces_xlsx() {
        let products = vec![ProductRecord {
            id: Uuid::new_v4(),
            serial_number: "20260806001".to_string(),
            name: "旺仔牛奶".to_string(),
            brand: "旺旺".to_string(),
            price: "￥4.50".to_string(),
            barcode: "6901234567892".to_string(),
            description: String::new(),
            image_paths: vec!["/uploads/a.jpg".to_string()],
            created_at: "2026-08-06T08:00:00+00:00".to_string(),
            updated_at: "2026-08-06T08:00:00+00:00".to_string(),
        }];

        let buffer = build_workbook(&products).unwrap();
        // xlsx 是 zip 容器，以 PK 开头
        assert_eq!(&buffer[..2], b"PK");
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("abc-123.xlsx"), "abc-123.xlsx");
        assert_eq!(percent_encode("产品"), "%E4%BA%A7%E5%93%81");
    }

    #[test]
    fn test_format_created_at_falls_back_to_raw() {
        assert_eq!(format_created_at("not-a-date"), "not-a-date");
    }
}
