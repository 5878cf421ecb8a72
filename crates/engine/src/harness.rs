//! Shared fixtures for module tests: a small "orders" grid with the
//! value shapes the engine has to cope with (null fields, numeric
//! strings, unparseable dates, select options).

use serde_json::{json, Value};

use crate::column::{Column, DataType};
use crate::row::Row;

/// Build a row from a JSON object with identity under `"id"`.
pub fn row_json(value: Value) -> Row {
    Row::from_object("id", value).expect("fixture rows are valid objects")
}

/// Column set for the orders fixture.
pub fn order_columns() -> Vec<Column> {
    vec![
        Column::new("id", "ID", DataType::Number).mandatory().with_width(80),
        Column::new("status", "Status", DataType::Select)
            .editable()
            .with_options(vec![
                "Released".to_string(),
                "Cancelled".to_string(),
                "Active".to_string(),
            ]),
        Column::new("amount", "Amount", DataType::Number).editable(),
        Column::new("driver", "Driver", DataType::Text),
        Column::new("created", "Created", DataType::Date),
        Column::new("notes", "Notes", DataType::Text)
            .not_sortable()
            .not_filterable()
            .sub_row(),
    ]
}

/// Three orders: two released, one cancelled. Row 2 has a null driver,
/// row 3 an unparseable date.
pub fn order_rows() -> Vec<Row> {
    vec![
        row_json(json!({
            "id": 1,
            "status": "Released",
            "amount": 120,
            "driver": "Ana",
            "created": "2026-01-05",
            "notes": "priority"
        })),
        row_json(json!({
            "id": 2,
            "status": "Cancelled",
            "amount": 45,
            "driver": null,
            "created": "2026-02-10",
            "notes": ""
        })),
        row_json(json!({
            "id": 3,
            "status": "Released",
            "amount": 80,
            "driver": "Luka",
            "created": "tbd",
            "notes": "recheck billing"
        })),
    ]
}

/// Borrowed view of a column slice, as the filter engine consumes it.
pub fn refs(columns: &[Column]) -> Vec<&Column> {
    columns.iter().collect()
}

/// `count` generated orders cycling through three statuses.
pub fn many_orders(count: usize) -> Vec<Row> {
    let statuses = ["Released", "Cancelled", "Active"];
    (1..=count)
        .map(|i| {
            row_json(json!({
                "id": i,
                "status": statuses[i % statuses.len()],
                "amount": (i * 10) % 500,
                "driver": format!("driver-{}", i % 7),
                "created": "2026-01-01",
                "notes": ""
            }))
        })
        .collect()
}
