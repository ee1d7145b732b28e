//! Batches for common profiling scenarios, shared by unit tests,
//! integration tests and benchmarks.

use std::sync::Arc;

use arrow::array::{BooleanArray, Float64Array, Int64Array, StringArray, TimestampMillisecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, TimeZone, Utc};

use crate::batch::{CellValue, Column, TabularBatch};
use crate::config::ForeignKeyDeclaration;
use crate::error::Result;

/// A fixed instant for deterministic date-relative output.
pub fn reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// `id` = 1..=5 with no nulls.
pub fn unique_ids() -> Result<TabularBatch> {
    TabularBatch::new("ids", vec![Column::from_values("id", 1i64..=5)])
}

/// Two valid addresses, one invalid and a null.
pub fn emails_with_invalid() -> Result<TabularBatch> {
    TabularBatch::new(
        "contacts",
        vec![Column::new(
            "email",
            vec![
                CellValue::from("a@b.com"),
                CellValue::from("not-an-email"),
                CellValue::from("c@d.com"),
                CellValue::Null,
            ],
        )],
    )
}

/// `[1, 2, 3, 4, 100]`
pub fn numeric_with_outlier() -> Result<TabularBatch> {
    TabularBatch::new(
        "measurements",
        vec![Column::from_values("reading", [1i64, 2, 3, 4, 100])],
    )
}

/// 100 rows, 96 of them null.
pub fn mostly_null() -> Result<TabularBatch> {
    let values = (0..100)
        .map(|i| if i < 4 { CellValue::Int(i) } else { CellValue::Null })
        .collect();
    TabularBatch::new("sparse", vec![Column::new("value", values)])
}

pub fn customers() -> Result<TabularBatch> {
    TabularBatch::new(
        "customer",
        vec![
            Column::from_values("id", 1i64..=8),
            Column::from_values(
                "name",
                ["Ada", "Grace", "Alan", "Edsger", "Barbara", "Donald", "Ken", "Niklaus"],
            ),
        ],
    )
}

/// Ten orders, two of which reference customers that do not exist.
pub fn orders_with_orphans() -> Result<TabularBatch> {
    TabularBatch::new(
        "order",
        vec![
            Column::from_values("order_id", 100i64..110),
            Column::from_values("customer_id", [1i64, 2, 3, 4, 5, 6, 7, 8, 41, 42]),
            Column::from_values(
                "amount",
                [12.5, 40.0, 7.25, 99.0, 15.0, 23.5, 8.0, 61.0, 19.99, 5.0],
            ),
        ],
    )
}

pub fn order_customer_foreign_key() -> ForeignKeyDeclaration {
    ForeignKeyDeclaration::new("order.customer_id", "customer.id")
}

/// A small dataset mixing every inferred type and a few quality problems.
pub fn mixed_quality(rows: usize) -> Result<TabularBatch> {
    let base = reference_time().naive_utc();
    let columns = vec![
        Column::from_values("user_id", (0..rows).map(|i| i as i64 + 1)),
        Column::new(
            "email",
            (0..rows)
                .map(|i| {
                    if i % 10 == 9 {
                        CellValue::Null
                    } else {
                        CellValue::Text(format!("user{i}@example.com"))
                    }
                })
                .collect(),
        ),
        Column::from_values("age", (0..rows).map(|i| 18 + (i % 50) as i64)),
        Column::from_values(
            "city",
            (0..rows).map(|i| match i % 4 {
                0 => "Oslo",
                1 => " Lima",
                2 => "Quito",
                _ => "OSLO",
            }),
        ),
        Column::from_values(
            "signup_date",
            (0..rows).map(|i| {
                (base - chrono::Duration::days(i as i64))
                    .format("%Y-%m-%d")
                    .to_string()
            }),
        ),
        Column::from_values("active", (0..rows).map(|i| i % 3 != 0)),
    ];
    TabularBatch::new("users", columns)
}

/// An Arrow batch with one column per supported physical type family.
pub fn people_record_batch() -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("email", DataType::Utf8, true),
        Field::new("score", DataType::Float64, true),
        Field::new("active", DataType::Boolean, true),
        Field::new(
            "updated_at",
            DataType::Timestamp(TimeUnit::Millisecond, None),
            true,
        ),
    ]));
    let updated = reference_time().timestamp_millis();
    Ok(RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5])),
            Arc::new(StringArray::from(vec![
                Some("ada@example.com"),
                Some("grace@example.com"),
                None,
                Some("alan@example.com"),
                Some("ken@example.com"),
            ])),
            Arc::new(Float64Array::from(vec![
                Some(71.5),
                Some(88.0),
                Some(64.25),
                None,
                Some(93.0),
            ])),
            Arc::new(BooleanArray::from(vec![
                Some(true),
                Some(false),
                Some(true),
                Some(true),
                None,
            ])),
            Arc::new(TimestampMillisecondArray::from(vec![
                Some(updated),
                Some(updated - 86_400_000),
                Some(updated - 2 * 86_400_000),
                None,
                Some(updated - 3 * 86_400_000),
            ])),
        ],
    )?)
}
