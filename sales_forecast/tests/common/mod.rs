#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use sales_forecast::{ForecastConfig, SalesFrame, SalesRecord};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn day(offset: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
        + Duration::days(offset)
}

/// `days` daily sales with a weekly pattern and a slow upward drift
pub fn product_records(product_id: &str, days: usize, base: f64) -> Vec<SalesRecord> {
    (0..days)
        .map(|i| {
            let quantity = base + (i % 7) as f64 + 0.1 * i as f64;
            SalesRecord::new(day(i as i64), product_id, quantity, 2.5)
        })
        .collect()
}

pub fn sales_frame(products: &[(&str, usize, f64)]) -> SalesFrame {
    let records: Vec<SalesRecord> = products
        .iter()
        .flat_map(|(id, days, base)| product_records(id, *days, *base))
        .collect();
    SalesFrame::from_records(&records)
}

pub fn write_sales_csv(dir: &Path, products: &[(&str, usize, f64)]) -> PathBuf {
    let path = dir.join("sales.csv");
    let mut file = File::create(&path).unwrap();
    writeln!(file, "timestamp,product_id,quantity,unit_price,total_amount").unwrap();

    for (id, days, base) in products {
        for record in product_records(id, *days, *base) {
            writeln!(
                file,
                "{},{},{},{},{}",
                record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                record.product_id,
                record.quantity.unwrap(),
                record.unit_price.unwrap(),
                record.total_amount.unwrap()
            )
            .unwrap();
        }
    }

    path
}

pub fn config_in(dir: &Path) -> ForecastConfig {
    ForecastConfig::default().with_model_dir(dir)
}
