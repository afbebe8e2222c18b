//! Named SQL fragments substituted into template slots.

/// Reusable piece of SQL text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    pub name: &'static str,
    pub text: &'static str,
}

impl Fragment {
    pub const fn new(name: &'static str, text: &'static str) -> Self {
        Self { name, text }
    }
}

/// Substituted for a slot whose condition is off
pub const EMPTY: Fragment = Fragment::new("empty", "");

// -- live sessions --

pub const PLAN_PROJECTION: Fragment = Fragment::new("live_sessions.plan_projection", "b.query_plan");

/// Keeps the Execution_Plan column (typed NULL) when plans are not requested
pub const NO_PLAN_PROJECTION: Fragment =
    Fragment::new("live_sessions.no_plan_projection", "CAST(NULL AS XML)");

pub const PLAN_JOIN: Fragment = Fragment::new(
    "live_sessions.plan_join",
    r#"    LEFT JOIN (SELECT sqe.session_id
                    , ph.query_plan
                FROM sys.dm_exec_requests sqe (NOLOCK)
                    CROSS APPLY sys.dm_exec_query_plan(sqe.plan_handle) ph) b ON qe.session_id = b.session_id"#,
);

pub const USER_SESSIONS_ONLY: Fragment =
    Fragment::new("live_sessions.user_sessions_only", "AND s.is_user_process = 1");

// -- file map --

pub const EXCLUDE_DATA_FILES: Fragment = Fragment::new("file_map.exclude_data", "AND b.type != 0");
pub const EXCLUDE_LOG_FILES: Fragment = Fragment::new("file_map.exclude_log", "AND b.type = 0");

// -- wait statistics --

/// Prefix of the exclusion clause; followed by the bound placeholder list and `)`
pub const WAIT_TYPE_EXCLUSION: Fragment =
    Fragment::new("wait_statistics.exclusion", "AND [wait_type] NOT IN (");

// -- error log --

pub const ERROR_LOG_START_BOUND: Fragment =
    Fragment::new("error_log.start_bound", "OR LogDate < @start_time");
pub const ERROR_LOG_END_BOUND: Fragment =
    Fragment::new("error_log.end_bound", "OR LogDate > @end_time");

pub const INFORMATIONAL_SUPPRESSION: Fragment = Fragment::new(
    "error_log.informational_suppression",
    r#"
DELETE FROM #ErrorLog
WHERE vchMessage LIKE '%This is an informational message%'
    OR vchMessage LIKE '%DBCC CHECKDB%found 0 errors and repaired 0 errors%'
    OR vchMessage LIKE '%No user action is required%'
    OR vchMessage LIKE '%No user action required%'
    OR vchMessage LIKE N'%Ce message est fourni à titre d''information. Aucune action n''est requise de la part de l''utilisateur.%'
"#,
);

// -- failed logins --

pub const FAILED_LOGIN_START_BOUND: Fragment =
    Fragment::new("failed_logins.start_bound", "AND LogDate > @start_time");
pub const FAILED_LOGIN_END_BOUND: Fragment =
    Fragment::new("failed_logins.end_bound", "AND LogDate < @end_time");

pub const ALL: &[Fragment] = &[
    EMPTY,
    PLAN_PROJECTION,
    NO_PLAN_PROJECTION,
    PLAN_JOIN,
    USER_SESSIONS_ONLY,
    EXCLUDE_DATA_FILES,
    EXCLUDE_LOG_FILES,
    WAIT_TYPE_EXCLUSION,
    ERROR_LOG_START_BOUND,
    ERROR_LOG_END_BOUND,
    INFORMATIONAL_SUPPRESSION,
    FAILED_LOGIN_START_BOUND,
    FAILED_LOGIN_END_BOUND,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_names_are_unique() {
        for (i, fragment) in ALL.iter().enumerate() {
            assert!(
                ALL[i + 1..].iter().all(|other| other.name != fragment.name),
                "{}",
                fragment.name
            );
        }
    }

    #[test]
    fn test_fragments_have_no_slots() {
        for fragment in ALL {
            assert!(!fragment.text.contains('{'), "{}", fragment.name);
        }
    }
}
