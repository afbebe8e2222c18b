use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a diagnostic operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationId {
    MachineType,
    LastRestart,
    ServiceStatus,
    LiveSessions,
    Who,
    BackupHistory,
    SysadminMembers,
    FileMap,
    IoStatistics,
    FreeDiskSpace,
    CpuByDatabase,
    CpuHistory,
    BufferByDatabase,
    WaitStatistics,
    ErrorLog,
    FailedLogins,
    TopProcedures,
    TopQueries,
}

impl OperationId {
    pub const ALL: [OperationId; 18] = [
        OperationId::MachineType,
        OperationId::LastRestart,
        OperationId::ServiceStatus,
        OperationId::LiveSessions,
        OperationId::Who,
        OperationId::BackupHistory,
        OperationId::SysadminMembers,
        OperationId::FileMap,
        OperationId::IoStatistics,
        OperationId::FreeDiskSpace,
        OperationId::CpuByDatabase,
        OperationId::CpuHistory,
        OperationId::BufferByDatabase,
        OperationId::WaitStatistics,
        OperationId::ErrorLog,
        OperationId::FailedLogins,
        OperationId::TopProcedures,
        OperationId::TopQueries,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            OperationId::MachineType => "machine_type",
            OperationId::LastRestart => "last_restart",
            OperationId::ServiceStatus => "service_status",
            OperationId::LiveSessions => "live_sessions",
            OperationId::Who => "who",
            OperationId::BackupHistory => "backup_history",
            OperationId::SysadminMembers => "sysadmin_members",
            OperationId::FileMap => "file_map",
            OperationId::IoStatistics => "io_statistics",
            OperationId::FreeDiskSpace => "free_disk_space",
            OperationId::CpuByDatabase => "cpu_by_database",
            OperationId::CpuHistory => "cpu_history",
            OperationId::BufferByDatabase => "buffer_by_database",
            OperationId::WaitStatistics => "wait_statistics",
            OperationId::ErrorLog => "error_log",
            OperationId::FailedLogins => "failed_logins",
            OperationId::TopProcedures => "top_procedures",
            OperationId::TopQueries => "top_queries",
        }
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationId {
    type Err = String;

    /// Accepts snake_case or kebab-case ids.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        OperationId::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = OperationId::ALL.iter().map(|op| op.as_str()).collect();
                format!("unknown operation '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_kebab_case() {
        assert_eq!(
            "wait-statistics".parse::<OperationId>(),
            Ok(OperationId::WaitStatistics)
        );
        assert_eq!("TOP_QUERIES".parse::<OperationId>(), Ok(OperationId::TopQueries));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "drop_database".parse::<OperationId>().unwrap_err();
        assert!(err.contains("unknown operation 'drop_database'"));
        assert!(err.contains("live_sessions"));
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ids: Vec<&str> = OperationId::ALL.iter().map(|op| op.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), OperationId::ALL.len());
    }
}
