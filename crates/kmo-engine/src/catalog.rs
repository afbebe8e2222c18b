//! Static registry of diagnostic operations.

use kmo_types::{
    Capability, Column, ErrorLogOptions, FailedLoginOptions, FileMapOptions, LiveSessionOptions,
    OperationId, OperationOptions, OptionSchema, SemanticType, TopProceduresOptions,
    TopQueriesOptions, VersionRequirement, WaitStatisticsOptions,
};
use serde::Serialize;

use crate::wait_types::default_ignored_wait_types;

/// Declared output column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub semantic_type: SemanticType,
}

const fn col(name: &'static str, semantic_type: SemanticType) -> ColumnSpec {
    ColumnSpec {
        name,
        semantic_type,
    }
}

const INT: SemanticType = SemanticType::Integer;
const TEXT: SemanticType = SemanticType::Text;
const DATETIME: SemanticType = SemanticType::DateTime;

const fn decimal(precision: u8, scale: u8) -> SemanticType {
    SemanticType::Decimal { precision, scale }
}

/// Registry entry for one diagnostic operation
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DiagnosticOperation {
    pub id: OperationId,
    pub display_name: &'static str,
    pub required_capability: Option<Capability>,
    pub option_schema: OptionSchema,
    pub template_id: &'static str,
    pub columns: &'static [ColumnSpec],
}

impl DiagnosticOperation {
    pub fn min_version(&self) -> Option<VersionRequirement> {
        self.required_capability.and_then(Capability::min_version)
    }

    pub fn declared_columns(&self) -> Vec<Column> {
        self.columns
            .iter()
            .map(|c| Column::new(c.name, c.semantic_type))
            .collect()
    }

    pub fn column_type(&self, name: &str) -> Option<SemanticType> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(|c| c.semantic_type)
    }
}

const LOG_COLUMNS: &[ColumnSpec] = &[
    col("LogDate", DATETIME),
    col("ProcessInfo", TEXT),
    col("Message", TEXT),
];

// Indexed by `OperationId as usize`; the order must follow the enum.
static CATALOG: [DiagnosticOperation; 18] = [
    DiagnosticOperation {
        id: OperationId::MachineType,
        display_name: "Machine type",
        required_capability: Some(Capability::VirtualMachineInfo),
        option_schema: OptionSchema::None,
        template_id: "machine_type",
        columns: &[col("virtual_machine_type_desc", TEXT)],
    },
    DiagnosticOperation {
        id: OperationId::LastRestart,
        display_name: "Last restart",
        required_capability: None,
        option_schema: OptionSchema::None,
        template_id: "last_restart",
        columns: &[col("create_date", DATETIME)],
    },
    DiagnosticOperation {
        id: OperationId::ServiceStatus,
        display_name: "Service status",
        required_capability: Some(Capability::ServerServices),
        option_schema: OptionSchema::None,
        template_id: "service_status",
        columns: &[col("servicename", TEXT), col("serviceInfo", TEXT)],
    },
    DiagnosticOperation {
        id: OperationId::LiveSessions,
        display_name: "Live sessions",
        required_capability: Some(Capability::DynamicManagementViews),
        option_schema: OptionSchema::LiveSessions,
        template_id: "live_sessions",
        columns: &[
            col("Kill", TEXT),
            col("Blocking_Session_Info", TEXT),
            col("Login", TEXT),
            col("Host_Name", TEXT),
            col("Program_Name", TEXT),
            col("Client_Interface_Name", TEXT),
            col("Database", TEXT),
            col("Logical_Read", INT),
            col("CPU_Time", INT),
            col("Duration", INT),
            col("Command", TEXT),
            col("Status", TEXT),
            col("Percent_Complete", SemanticType::Float),
            col("Start_Time", DATETIME),
            col("Open_Transaction_Count", INT),
            col("Query", TEXT),
            col("Execution_Plan", SemanticType::Xml),
        ],
    },
    DiagnosticOperation {
        id: OperationId::Who,
        display_name: "Who",
        required_capability: Some(Capability::DynamicManagementViews),
        option_schema: OptionSchema::None,
        template_id: "who",
        columns: &[
            col("spid", INT),
            col("Blocked", INT),
            col("Database", TEXT),
            col("Hostname", TEXT),
            col("Program Name", TEXT),
            col("Login Name", TEXT),
            col("NT Domain", TEXT),
            col("NT Username", TEXT),
            col("Auth protocol", TEXT),
            col("Wait Time", INT),
            col("Last Wait Type", TEXT),
            col("CPU", INT),
            col("Physical IO", INT),
            col("Memory", INT),
            col("Login Time", DATETIME),
            col("Last Batch", DATETIME),
            col("Execution Context ID", INT),
            col("Open Tran", INT),
            col("Status", TEXT),
            col("Host Process", TEXT),
            col("Command Type", TEXT),
            col("NET Adress", TEXT),
            col("NET Library", TEXT),
            col("Blocking", INT),
        ],
    },
    DiagnosticOperation {
        id: OperationId::BackupHistory,
        display_name: "Backup history",
        required_capability: Some(Capability::DynamicManagementViews),
        option_schema: OptionSchema::None,
        template_id: "backup_history",
        columns: &[
            col("DatabaseName", TEXT),
            col("recoveryModel", TEXT),
            col("LastBackUpTime", DATETIME),
            col("LastRestoreTime", DATETIME),
        ],
    },
    DiagnosticOperation {
        id: OperationId::SysadminMembers,
        display_name: "Sysadmin members",
        required_capability: Some(Capability::DynamicManagementViews),
        option_schema: OptionSchema::None,
        template_id: "sysadmin_members",
        columns: &[
            col("Login Name", TEXT),
            col("Login Type", TEXT),
            col("Create Date", DATETIME),
            col("Modify Date", DATETIME),
            col("Is Disabled", INT),
        ],
    },
    DiagnosticOperation {
        id: OperationId::FileMap,
        display_name: "File size and growth map",
        required_capability: Some(Capability::DynamicManagementViews),
        option_schema: OptionSchema::FileMap,
        template_id: "file_map",
        columns: &[
            col("DatabaseName", TEXT),
            col("FileName", TEXT),
            col("FileType", TEXT),
            col("FileSize", decimal(18, 2)),
            col("FreeSpace", decimal(38, 6)),
            col("physical_name", TEXT),
            col("LastGrowth", INT),
        ],
    },
    DiagnosticOperation {
        id: OperationId::IoStatistics,
        display_name: "IO statistics",
        required_capability: Some(Capability::DynamicManagementViews),
        option_schema: OptionSchema::None,
        template_id: "io_statistics",
        columns: &[
            col("Database Name", TEXT),
            col("Physical Name", TEXT),
            col("IO Stall Read ms", INT),
            col("Num of Reads", INT),
            col("Avg Read Stall ms", decimal(10, 1)),
            col("IO Stall Write ms", INT),
            col("Num of Writes", INT),
            col("Avg Write Stall ms", decimal(10, 1)),
            col("IO Stalls", INT),
            col("Total IO", INT),
            col("Avg IO Stall ms", decimal(10, 1)),
        ],
    },
    DiagnosticOperation {
        id: OperationId::FreeDiskSpace,
        display_name: "Free disk space",
        required_capability: None,
        option_schema: OptionSchema::None,
        template_id: "free_disk_space",
        columns: &[
            col("drive", TEXT),
            col("TotalSize", INT),
            col("FreeSpace", INT),
        ],
    },
    DiagnosticOperation {
        id: OperationId::CpuByDatabase,
        display_name: "CPU by database",
        required_capability: Some(Capability::DynamicManagementViews),
        option_schema: OptionSchema::None,
        template_id: "cpu_by_database",
        columns: &[
            col("Database Name", TEXT),
            col("CPU Time Ms", INT),
            col("CPU Percent", decimal(5, 2)),
        ],
    },
    DiagnosticOperation {
        id: OperationId::CpuHistory,
        display_name: "CPU history",
        required_capability: Some(Capability::DynamicManagementViews),
        option_schema: OptionSchema::None,
        template_id: "cpu_history",
        columns: &[
            col("EventTime", DATETIME),
            col("system_cpu", INT),
            col("sql_cpu", INT),
        ],
    },
    DiagnosticOperation {
        id: OperationId::BufferByDatabase,
        display_name: "Buffer by database",
        required_capability: Some(Capability::DynamicManagementViews),
        option_schema: OptionSchema::None,
        template_id: "buffer_by_database",
        columns: &[col("Database", TEXT), col("Cached_Size", INT)],
    },
    DiagnosticOperation {
        id: OperationId::WaitStatistics,
        display_name: "Wait statistics",
        required_capability: Some(Capability::DynamicManagementViews),
        option_schema: OptionSchema::WaitStatistics,
        template_id: "wait_statistics",
        columns: &[
            col("wait_type", TEXT),
            col("wait_time_s", decimal(16, 2)),
            col("Resource_S", decimal(16, 2)),
            col("Signal_S", decimal(16, 2)),
            col("waiting_tasks_count", INT),
            col("pct", decimal(5, 2)),
            col("AvgWait_S", decimal(16, 4)),
            col("AvgRes_S", decimal(16, 4)),
            col("AvgSig_S", decimal(16, 4)),
        ],
    },
    DiagnosticOperation {
        id: OperationId::ErrorLog,
        display_name: "Error log",
        required_capability: None,
        option_schema: OptionSchema::ErrorLog,
        template_id: "error_log",
        columns: LOG_COLUMNS,
    },
    DiagnosticOperation {
        id: OperationId::FailedLogins,
        display_name: "Failed logins",
        required_capability: None,
        option_schema: OptionSchema::FailedLogins,
        template_id: "failed_logins",
        columns: LOG_COLUMNS,
    },
    DiagnosticOperation {
        id: OperationId::TopProcedures,
        display_name: "Top stored procedures",
        required_capability: Some(Capability::ProcedureStats),
        option_schema: OptionSchema::TopProcedures,
        template_id: "top_procedures",
        columns: &[
            col("Database", TEXT),
            col("Stored Procedure", TEXT),
            col("Cached Time", DATETIME),
            col("Last Execution Time", DATETIME),
            col("Execution Count", INT),
            col("Average CPU", INT),
            col("Average Elapsed Time", INT),
            col("Average Logical Reads", INT),
            col("Average Logical Writes", INT),
            col("Average Physical Reads", INT),
        ],
    },
    DiagnosticOperation {
        id: OperationId::TopQueries,
        display_name: "Top queries",
        required_capability: Some(Capability::DynamicManagementViews),
        option_schema: OptionSchema::TopQueries,
        template_id: "top_queries",
        columns: &[
            col("Database", TEXT),
            col("Query", TEXT),
            col("Execution Count", INT),
            col("Average Worker Time", INT),
            col("Average Physical Reads", INT),
            col("Average Logical Reads", INT),
            col("Average Logical Writes", INT),
            col("Average Elapsed Time", INT),
            col("Parent Query", TEXT),
        ],
    },
];

pub fn all() -> &'static [DiagnosticOperation] {
    &CATALOG
}

pub fn get(id: OperationId) -> &'static DiagnosticOperation {
    &CATALOG[id as usize]
}

/// Default option values. Overridable per deployment through configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub wait_statistics: WaitStatisticsOptions,
    pub error_log: ErrorLogOptions,
    pub failed_logins: FailedLoginOptions,
    pub top_procedures: TopProceduresOptions,
    pub top_queries: TopQueriesOptions,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            wait_statistics: WaitStatisticsOptions::new(default_ignored_wait_types()),
            error_log: ErrorLogOptions::default(),
            failed_logins: FailedLoginOptions::default(),
            top_procedures: TopProceduresOptions::default(),
            top_queries: TopQueriesOptions::default(),
        }
    }
}

impl Defaults {
    pub fn options_for(&self, id: OperationId) -> OperationOptions {
        match get(id).option_schema {
            OptionSchema::None => OperationOptions::None,
            OptionSchema::LiveSessions => OperationOptions::LiveSessions(LiveSessionOptions::default()),
            OptionSchema::FileMap => OperationOptions::FileMap(FileMapOptions::default()),
            OptionSchema::ErrorLog => OperationOptions::ErrorLog(self.error_log.clone()),
            OptionSchema::FailedLogins => OperationOptions::FailedLogins(self.failed_logins.clone()),
            OptionSchema::WaitStatistics => {
                OperationOptions::WaitStatistics(self.wait_statistics.clone())
            }
            OptionSchema::TopProcedures => {
                OperationOptions::TopProcedures(self.top_procedures.clone())
            }
            OptionSchema::TopQueries => OperationOptions::TopQueries(self.top_queries.clone()),
        }
    }
}

/// Built-in defaults for `id`
pub fn default_options(id: OperationId) -> OperationOptions {
    Defaults::default().options_for(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates;
    use kmo_types::{ProcedureSortColumn, QuerySortColumn};

    #[test]
    fn test_catalog_is_indexed_by_operation_id() {
        assert_eq!(all().len(), OperationId::ALL.len());
        for id in OperationId::ALL {
            assert_eq!(get(id).id, id);
        }
    }

    #[test]
    fn test_every_template_id_resolves() {
        for op in all() {
            assert!(
                templates::get(op.template_id).is_some(),
                "missing template {}",
                op.template_id
            );
        }
    }

    #[test]
    fn test_every_operation_declares_columns() {
        for op in all() {
            assert!(!op.columns.is_empty(), "{}", op.id);
        }
    }

    #[test]
    fn test_default_options_match_schema() {
        for id in OperationId::ALL {
            assert_eq!(default_options(id).schema(), get(id).option_schema, "{}", id);
        }
    }

    #[test]
    fn test_top_n_defaults() {
        let OperationOptions::TopQueries(opts) = default_options(OperationId::TopQueries) else {
            panic!("expected top queries options");
        };
        assert_eq!(opts.order_by, QuerySortColumn::ExecutionCount);
        assert_eq!(opts.row_limit, 50);

        let OperationOptions::TopProcedures(opts) = default_options(OperationId::TopProcedures)
        else {
            panic!("expected top procedures options");
        };
        assert_eq!(opts.order_by, ProcedureSortColumn::ExecutionCount);
    }

    #[test]
    fn test_procedure_stats_requires_2008() {
        let op = get(OperationId::TopProcedures);
        assert_eq!(op.required_capability, Some(Capability::ProcedureStats));
        assert_eq!(op.min_version(), Some(VersionRequirement::new(10, 0)));
    }

    #[test]
    fn test_column_type_lookup() {
        let op = get(OperationId::WaitStatistics);
        assert_eq!(op.column_type("PCT"), Some(decimal(5, 2)));
        assert_eq!(op.column_type("nope"), None);
    }
}
