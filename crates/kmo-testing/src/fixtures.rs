//! Raw fixtures: version identifiers per release and canned result sets.

use chrono::{NaiveDate, NaiveDateTime};
use kmo_runtime::{RawColumn, RawResult, RawValue};
use kmo_types::RawVersion;

pub fn raw_version(major: u32, minor: u32, version_string: &str) -> RawVersion {
    RawVersion {
        major,
        minor,
        product_level: "RTM".to_string(),
        edition: "Standard Edition (64-bit)".to_string(),
        version_string: version_string.to_string(),
    }
}

pub fn sql_server_2005() -> RawVersion {
    raw_version(9, 0, "9.00.5000.00")
}

pub fn sql_server_2008() -> RawVersion {
    raw_version(10, 0, "10.0.6000.29")
}

pub fn sql_server_2008_r2() -> RawVersion {
    raw_version(10, 50, "10.50.6000.34")
}

pub fn sql_server_2016() -> RawVersion {
    RawVersion {
        product_level: "SP2".to_string(),
        edition: "Enterprise Edition (64-bit)".to_string(),
        ..raw_version(13, 0, "13.0.5026.0")
    }
}

/// Single text column, single row
pub fn single_text(column: &str, value: &str) -> RawResult {
    RawResult::new(
        vec![RawColumn::typed(column, "nvarchar")],
        vec![vec![RawValue::Text(value.to_string())]],
    )
}

/// `virtual_machine_type_desc` probe answer
pub fn machine_type(desc: &str) -> RawResult {
    single_text("virtual_machine_type_desc", desc)
}

/// tempdb `create_date` probe answer
pub fn tempdb_created(at: NaiveDateTime) -> RawResult {
    RawResult::new(
        vec![RawColumn::typed("create_date", "datetime")],
        vec![vec![RawValue::DateTime(at)]],
    )
}

/// 'Ole Automation Procedures' run value
pub fn ole_automation(value_in_use: i64) -> RawResult {
    RawResult::new(
        vec![RawColumn::typed("value_in_use", "int")],
        vec![vec![RawValue::Int(value_in_use)]],
    )
}

/// Buffer pool usage in deliberately non-alphabetical, non-sorted order
pub fn buffer_by_database() -> RawResult {
    RawResult::new(
        vec![
            RawColumn::typed("Database", "nvarchar"),
            RawColumn::typed("Cached_Size", "int"),
        ],
        vec![
            vec![RawValue::Text("tempdb".to_string()), RawValue::Int(812)],
            vec![RawValue::Text("Resource".to_string()), RawValue::Int(40)],
            vec![RawValue::Text("master".to_string()), RawValue::Int(40)],
            vec![RawValue::Text("AdventureWorks".to_string()), RawValue::Int(1500)],
        ],
    )
}

/// Wait statistics row with decimals delivered as text, as some drivers do
pub fn wait_statistics() -> RawResult {
    let columns = [
        "wait_type",
        "wait_time_s",
        "Resource_S",
        "Signal_S",
        "waiting_tasks_count",
        "pct",
        "AvgWait_S",
        "AvgRes_S",
        "AvgSig_S",
    ]
    .into_iter()
    .map(RawColumn::new)
    .collect();

    RawResult::new(
        columns,
        vec![vec![
            RawValue::Text("CXPACKET".to_string()),
            RawValue::Text("1234.56".to_string()),
            RawValue::Text("1200.00".to_string()),
            RawValue::Text("34.56".to_string()),
            RawValue::Int(9876),
            RawValue::Text("61.20".to_string()),
            RawValue::Text("0.1250".to_string()),
            RawValue::Text("0.1215".to_string()),
            RawValue::Text("0.0035".to_string()),
        ]],
    )
}

/// Error log rows, newest first
pub fn error_log() -> RawResult {
    RawResult::new(
        vec![
            RawColumn::typed("LogDate", "datetime"),
            RawColumn::typed("ProcessInfo", "nvarchar"),
            RawColumn::typed("Message", "nvarchar"),
        ],
        vec![
            vec![
                RawValue::DateTime(timestamp(2024, 5, 2, 9, 30)),
                RawValue::Text("spid51".to_string()),
                RawValue::Text("Database backed up.".to_string()),
            ],
            vec![
                RawValue::DateTime(timestamp(2024, 5, 1, 23, 0)),
                RawValue::Text("Server".to_string()),
                RawValue::Text("SQL Server is starting.".to_string()),
            ],
        ],
    )
}

pub fn timestamp(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .expect("valid fixture timestamp")
}
