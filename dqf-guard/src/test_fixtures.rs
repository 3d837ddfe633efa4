//! Small in-memory datasets shared by unit tests, integration tests and
//! benchmarks.
//!
//! `orders.customer_id` references `customers.id` with two orphaned values
//! (9 and 7) and one missing value.

use crate::core::{Dataset, RunContext};
use arrow::array::{Float64Array, Int64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use std::collections::HashMap;
use std::sync::Arc;

/// Five customers. `name` has one missing value and `email` has two.
pub fn customers_dataset() -> Dataset {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, true),
        Field::new("email", DataType::Utf8, true),
        Field::new(
            "signup_date",
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            true,
        ),
    ]));

    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5])),
            Arc::new(StringArray::from(vec![
                Some("Alice"),
                Some("Bob"),
                None,
                Some("David"),
                Some("Eve"),
            ])),
            Arc::new(StringArray::from(vec![
                Some("alice@example.com"),
                None,
                Some("carol@example.com"),
                None,
                Some("eve@example.com"),
            ])),
            Arc::new(
                TimestampMicrosecondArray::from(vec![
                    Some(1_704_067_200_000_000), // 2024-01-01
                    Some(1_706_745_600_000_000), // 2024-02-01
                    Some(1_709_251_200_000_000), // 2024-03-01
                    Some(1_711_929_600_000_000), // 2024-04-01
                    Some(1_714_521_600_000_000), // 2024-05-01
                ])
                .with_timezone("UTC"),
            ),
        ],
    )
    .unwrap();

    Dataset::new(batch)
}

/// Six orders with ISO-8601 `updated_at` strings, the latest being
/// 2024-06-01T12:00:00Z.
pub fn orders_dataset() -> Dataset {
    let schema = Arc::new(Schema::new(vec![
        Field::new("order_id", DataType::Int64, false),
        Field::new("customer_id", DataType::Int64, true),
        Field::new("amount", DataType::Float64, true),
        Field::new("status", DataType::Utf8, true),
        Field::new("updated_at", DataType::Utf8, true),
    ]));

    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![100, 101, 102, 103, 104, 105])),
            Arc::new(Int64Array::from(vec![
                Some(1),
                Some(2),
                Some(2),
                Some(9),
                None,
                Some(7),
            ])),
            Arc::new(Float64Array::from(vec![
                Some(25.5),
                Some(120.0),
                Some(8.75),
                Some(42.0),
                None,
                Some(310.0),
            ])),
            Arc::new(StringArray::from(vec![
                "shipped",
                "pending",
                "shipped",
                "cancelled",
                "pending",
                "delivered",
            ])),
            Arc::new(StringArray::from(vec![
                "2024-05-28T09:15:00Z",
                "2024-05-30T18:40:00Z",
                "2024-06-01T12:00:00Z",
                "2024-05-31T07:05:00Z",
                "2024-06-01T08:30:00Z",
                "2024-05-29T22:10:00Z",
            ])),
        ],
    )
    .unwrap();

    Dataset::new(batch)
}

/// A dataset with an `id` column and no rows.
pub fn empty_dataset() -> Dataset {
    let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, true)]));
    let batch = RecordBatch::try_new(
        schema,
        vec![Arc::new(Int64Array::from(Vec::<Option<i64>>::new()))],
    )
    .unwrap();
    Dataset::new(batch)
}

/// A run context named `sample` holding `customers`, `orders` and `empty`.
pub fn sample_context() -> RunContext {
    let mut datasets = HashMap::new();
    datasets.insert("customers".to_string(), customers_dataset());
    datasets.insert("orders".to_string(), orders_dataset());
    datasets.insert("empty".to_string(), empty_dataset());
    RunContext::new("sample", datasets)
}

/// Generates an orders-like dataset of `rows` rows for load tests.
///
/// Every tenth `customer_id` is missing and every seventh `amount` is
/// negative; `order_id` is unique.
pub fn generated_orders(rows: usize) -> Dataset {
    let schema = Arc::new(Schema::new(vec![
        Field::new("order_id", DataType::Int64, false),
        Field::new("customer_id", DataType::Int64, true),
        Field::new("amount", DataType::Float64, true),
    ]));

    let order_ids: Vec<i64> = (0..rows as i64).collect();
    let customer_ids: Vec<Option<i64>> = (0..rows as i64)
        .map(|i| (i % 10 != 0).then_some(i % 1000))
        .collect();
    let amounts: Vec<f64> = (0..rows)
        .map(|i| if i % 7 == 0 { -1.0 } else { (i % 500) as f64 })
        .collect();

    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(order_ids)),
            Arc::new(Int64Array::from(customer_ids)),
            Arc::new(Float64Array::from(amounts)),
        ],
    )
    .unwrap();
    Dataset::new(batch)
}
