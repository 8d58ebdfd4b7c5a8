//! Plain-text and JSON renderings of store contents.

use crate::domain::model::{Customer, RentalRecord, Vehicle};
use crate::utils::error::Result;
use serde::Serialize;

const VEHICLE_HEADER: &str = "| Type       | Plate  | Make         | Model        | Year | Status         |";

pub fn vehicle_table<'a>(vehicles: impl IntoIterator<Item = &'a Vehicle>) -> String {
    let rows: String = vehicles
        .into_iter()
        .map(|vehicle| {
            format!(
                "| {:<10} | {:<6} | {:<12} | {:<12} | {:<4} | {:<14} |\n",
                vehicle.kind().label(),
                vehicle.license_plate().unwrap_or("-"),
                vehicle.make(),
                vehicle.model(),
                vehicle.year(),
                vehicle.status().to_string()
            )
        })
        .collect();

    let mut out = format!("{}\n{}\n", VEHICLE_HEADER, "-".repeat(VEHICLE_HEADER.len()));
    if rows.is_empty() {
        out.push_str("  (no vehicles)\n");
    } else {
        out.push_str(&rows);
    }
    out
}

pub fn customer_list(customers: &[Customer]) -> String {
    if customers.is_empty() {
        return "  (no customers)\n".to_string();
    }
    customers
        .iter()
        .map(|customer| format!("  {}\n", customer))
        .collect()
}

pub fn history<'a>(records: impl IntoIterator<Item = &'a RentalRecord>) -> String {
    let out: String = records
        .into_iter()
        .map(|record| format!("  {}\n", record))
        .collect();
    if out.is_empty() {
        "  (no rental records)\n".to_string()
    } else {
        out
    }
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
