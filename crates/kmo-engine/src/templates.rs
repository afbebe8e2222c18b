//! Base templates, one per diagnostic operation (plus internal probes).
//!
//! Templates are opaque to the executor: multi-statement bodies that build temp
//! tables on the server are still "one logical operation in, one table out".
//! Values are never part of a template; they are referenced as `@parameters`.

use crate::template::Template;

pub const MACHINE_TYPE: Template = Template::new(
    "machine_type",
    "SELECT virtual_machine_type_desc FROM sys.dm_os_sys_info",
);

// tempdb is recreated on every service start
pub const LAST_RESTART: Template = Template::new(
    "last_restart",
    "SELECT create_date FROM sys.databases WHERE name = 'tempdb'",
);

pub const SERVICE_STATUS: Template = Template::new(
    "service_status",
    r#"SELECT servicename
    , service_account + ' (' + status_desc + ')' AS serviceInfo
FROM sys.dm_server_services"#,
);

pub const LIVE_SESSIONS: Template = Template::new(
    "live_sessions",
    r#"SELECT CAST(qe.session_id AS VARCHAR) AS [Kill]
    , CASE WHEN CAST(blocking_session_id AS VARCHAR) = '0' THEN '' ELSE CAST(blocking_session_id AS VARCHAR) END AS [Blocking_Session_Info]
    , s.login_name AS [Login]
    , s.host_name AS [Host_Name]
    , s.program_name AS [Program_Name]
    , s.client_interface_name AS [Client_Interface_Name]
    , db_name(qe.database_id) AS [Database]
    , qe.logical_reads AS [Logical_Read]
    , qe.cpu_time AS [CPU_Time]
    , DATEDIFF(MINUTE, start_time, GETDATE()) AS [Duration]
    , command AS [Command]
    , qe.status AS [Status]
    , percent_complete AS [Percent_Complete]
    , start_time AS [Start_Time]
    , qe.open_transaction_count AS [Open_Transaction_Count]
    , a.text AS [Query]
    , {plan_projection} AS [Execution_Plan]
FROM sys.dm_exec_requests qe (NOLOCK)
    INNER JOIN sys.dm_exec_sessions s (NOLOCK) ON qe.session_id = s.session_id
    LEFT JOIN (SELECT sqe.session_id
                    , st.text
                FROM sys.dm_exec_requests sqe (NOLOCK)
                    CROSS APPLY sys.dm_exec_sql_text(sqe.sql_handle) st) a ON qe.session_id = a.session_id
{plan_join}
WHERE qe.session_id != @@SPID
    {session_filter}
ORDER BY blocking_session_id DESC
    , [Duration] DESC
    , [CPU_Time] DESC"#,
);

pub const WHO: Template = Template::new(
    "who",
    r#"SELECT sp.spid
    , sp.blocked AS Blocked
    , d.name AS [Database]
    , RTRIM(sp.hostname) AS [Hostname]
    , RTRIM(sp.program_name) AS [Program Name]
    , RTRIM(sp.loginame) AS [Login Name]
    , RTRIM(sp.nt_domain) AS [NT Domain]
    , RTRIM(sp.nt_username) AS [NT Username]
    , ec.auth_scheme AS [Auth protocol]
    , sp.waittime AS [Wait Time]
    , RTRIM(sp.lastwaittype) AS [Last Wait Type]
    , sp.cpu AS [CPU]
    , sp.physical_io AS [Physical IO]
    , sp.memusage AS [Memory]
    , sp.login_time AS [Login Time]
    , sp.last_batch AS [Last Batch]
    , sp.ecid AS [Execution Context ID]
    , sp.open_tran AS [Open Tran]
    , RTRIM(sp.status) AS [Status]
    , sp.hostprocess AS [Host Process]
    , RTRIM(sp.cmd) AS [Command Type]
    , sp.net_address AS [NET Adress]
    , RTRIM(sp.net_library) AS [NET Library]
    , sp2.spid AS [Blocking]
FROM master.dbo.sysprocesses sp
    LEFT JOIN master.dbo.sysdatabases d ON sp.dbid = d.dbid
    LEFT JOIN master.dbo.sysusers u ON sp.uid = u.uid
    LEFT JOIN master.dbo.sysprocesses sp2 ON sp.spid = sp2.blocked
    LEFT JOIN sys.dm_exec_connections ec ON sp.spid = ec.session_id AND ec.parent_connection_id IS NULL
ORDER BY sp.blocked
    , d.name
    , sp.cpu DESC"#,
);

pub const BACKUP_HISTORY: Template = Template::new(
    "backup_history",
    r#"SELECT sdb.name AS DatabaseName
    , MAX(sdb.recovery_model_desc) AS recoveryModel
    , MAX(bus.backup_finish_date) AS LastBackUpTime
    , MAX(rh.restore_date) AS LastRestoreTime
FROM sys.databases sdb (NOLOCK)
    LEFT OUTER JOIN msdb.dbo.backupset bus (NOLOCK) ON bus.database_name = sdb.name
        AND COALESCE(bus.is_snapshot, 0) != 1
        AND COALESCE(bus.type, 'D') = 'D'
    LEFT JOIN msdb.dbo.restorehistory rh (NOLOCK) ON rh.destination_database_name = sdb.name
GROUP BY sdb.name
ORDER BY sdb.name"#,
);

pub const SYSADMIN_MEMBERS: Template = Template::new(
    "sysadmin_members",
    r#"SELECT mem.name AS [Login Name]
    , mem.type_desc AS [Login Type]
    , mem.create_date AS [Create Date]
    , mem.modify_date AS [Modify Date]
    , mem.is_disabled AS [Is Disabled]
FROM sys.server_role_members AS srm (NOLOCK)
    INNER JOIN sys.server_principals AS mem (NOLOCK) ON mem.principal_id = srm.member_principal_id
    INNER JOIN sys.server_principals AS rol (NOLOCK) ON rol.principal_id = srm.role_principal_id
WHERE rol.name = 'sysadmin'
ORDER BY mem.name"#,
);

// Autogrowth events (92, 93) of the last 24h come from the default trace.
pub const FILE_MAP: Template = Template::new(
    "file_map",
    r#"CREATE TABLE #LastFileChange
(
    databasename NVARCHAR(128)
    , filename NVARCHAR(128)
    , endtime DATETIME
)

DECLARE @path NVARCHAR(1000)
SELECT @path = SUBSTRING(path, 1, LEN(path) - CHARINDEX('\', REVERSE(path))) + '\log.trc'
FROM sys.traces
WHERE id = 1;

WITH Growth (databaseid, filename, EndTime)
AS
(
    SELECT databaseid
        , filename
        , MAX(t.EndTime) AS EndTime
    FROM ::fn_trace_gettable(@path, default) t
    WHERE EventClass IN (92, 93)
        AND DATEDIFF(hh, StartTime, GETDATE()) < 24
    GROUP BY databaseid
        , filename
)
INSERT INTO #LastFileChange
(
    databasename
    , filename
    , endtime
)
SELECT DB_NAME(database_id) AS DatabaseName
    , mf.name AS LogicalName
    , g.EndTime
FROM sys.master_files mf
    LEFT JOIN Growth g ON mf.database_id = g.databaseid
        AND mf.name = g.filename
WHERE g.EndTime IS NOT NULL

CREATE TABLE #SpaceUsed
(
    DBNAME NVARCHAR(128)
    , FILENAME NVARCHAR(128)
    , SPACEUSED FLOAT
)

INSERT INTO #SpaceUsed
(
    DBNAME
    , FILENAME
    , SPACEUSED
)
EXEC('sp_MSforeachdb ''USE [?]; SELECT ''''?'''' AS DBName
            , name AS FileName
            , FILEPROPERTY(name, ''''SpaceUsed'''') AS SpaceUsed
        FROM sys.sysfiles''')

SELECT a.name AS DatabaseName
    , b.name AS FileName
    , CASE b.type WHEN 0 THEN 'DATA' ELSE b.type_desc END AS FileType
    , CAST((b.size * 8 / 1024.0) AS DECIMAL(18,2)) AS FileSize
    , CAST((b.size * 8 / 1024.0) - (d.SPACEUSED / 128.0) AS DECIMAL(15,2)) / CAST((b.size * 8 / 1024.0) AS DECIMAL(18,2)) * 100 AS FreeSpace
    , b.physical_name
    , DATEDIFF(DAY, c.endtime, GETDATE()) AS LastGrowth
FROM sys.databases a
    INNER JOIN sys.master_files b ON a.database_id = b.database_id
    INNER JOIN #SpaceUsed d ON a.name = d.DBNAME
        AND b.name = d.FILENAME
    LEFT JOIN #LastFileChange c ON a.name = c.databasename
        AND b.name = c.filename
WHERE b.size >= (@min_size_mb / 8.0 * 1024.0)
    AND b.size <= (@max_size_mb / 8.0 * 1024.0)
    {file_type_filter}
ORDER BY FileSize DESC

DROP TABLE #SpaceUsed
DROP TABLE #LastFileChange"#,
);

pub const IO_STATISTICS: Template = Template::new(
    "io_statistics",
    r#"SELECT DB_NAME(fs.database_id) AS [Database Name]
    , mf.physical_name AS [Physical Name]
    , io_stall_read_ms AS [IO Stall Read ms]
    , num_of_reads AS [Num of Reads]
    , CAST(io_stall_read_ms / (1.0 + num_of_reads) AS NUMERIC(10,1)) AS [Avg Read Stall ms]
    , io_stall_write_ms AS [IO Stall Write ms]
    , num_of_writes AS [Num of Writes]
    , CAST(io_stall_write_ms / (1.0 + num_of_writes) AS NUMERIC(10,1)) AS [Avg Write Stall ms]
    , io_stall_read_ms + io_stall_write_ms AS [IO Stalls]
    , num_of_reads + num_of_writes AS [Total IO]
    , CAST((io_stall_read_ms + io_stall_write_ms) / (1.0 + num_of_reads + num_of_writes) AS NUMERIC(10,1)) AS [Avg IO Stall ms]
FROM sys.dm_io_virtual_file_stats(NULL, NULL) AS fs
    INNER JOIN sys.master_files AS mf (NOLOCK) ON fs.database_id = mf.database_id
        AND fs.[file_id] = mf.[file_id]
ORDER BY [Avg IO Stall ms] DESC
OPTION (RECOMPILE)"#,
);

pub const FREE_DISK_SPACE: Template = Template::new(
    "free_disk_space",
    r#"DECLARE @t TABLE(
    drive VARCHAR(2)
    , TotalSize BIGINT DEFAULT 0
    , FreeSpace BIGINT)
INSERT INTO @t(drive, FreeSpace)
EXEC xp_fixeddrives
SELECT drive
    , TotalSize
    , FreeSpace
FROM @t"#,
);

// Same columns as FREE_DISK_SPACE, with TotalSize filled through the
// Scripting.FileSystemObject COM object.
pub const FREE_DISK_SPACE_OLE: Template = Template::new(
    "free_disk_space_ole",
    r#"SET NOCOUNT ON
DECLARE @hr INT
DECLARE @fso INT
DECLARE @drive CHAR(1)
DECLARE @odrive INT
DECLARE @TotalSize VARCHAR(20)
DECLARE @MB NUMERIC(18, 2)
SET @MB = 1048576

CREATE TABLE #drives(
    drive CHAR(1) PRIMARY KEY
    , FreeSpace INT NULL
    , TotalSize INT NULL)

INSERT #drives(drive, FreeSpace)
EXEC master.dbo.xp_fixeddrives

EXEC @hr = sp_OACreate 'Scripting.FileSystemObject', @fso OUT
IF @hr <> 0 EXEC sp_OAGetErrorInfo @fso

DECLARE dcur CURSOR LOCAL FAST_FORWARD
FOR SELECT drive
    FROM #drives
    ORDER BY drive
OPEN dcur FETCH NEXT FROM dcur INTO @drive
WHILE @@FETCH_STATUS = 0
BEGIN
    EXEC @hr = sp_OAMethod @fso, 'GetDrive', @odrive OUT, @drive
    IF @hr <> 0 EXEC sp_OAGetErrorInfo @fso
    EXEC @hr = sp_OAGetProperty @odrive, 'TotalSize', @TotalSize OUT
    IF @hr <> 0 EXEC sp_OAGetErrorInfo @odrive

    UPDATE #drives
        SET TotalSize = @TotalSize / @MB
    WHERE drive = @drive
FETCH NEXT FROM dcur INTO @drive
END
CLOSE dcur
DEALLOCATE dcur
EXEC @hr = sp_OADestroy @fso
IF @hr <> 0 EXEC sp_OAGetErrorInfo @fso
SELECT drive
    , TotalSize
    , FreeSpace
FROM #drives
ORDER BY drive
DROP TABLE #drives"#,
);

pub const CPU_BY_DATABASE: Template = Template::new(
    "cpu_by_database",
    r#"WITH DB_CPU_Stats AS
(
    SELECT DatabaseID
        , DB_NAME(DatabaseID) AS DatabaseName
        , SUM(total_worker_time) / 1000 AS CPU_Time_Ms
    FROM sys.dm_exec_query_stats AS qs (NOLOCK)
    CROSS APPLY (SELECT CONVERT(INT, value) AS DatabaseID
                FROM sys.dm_exec_plan_attributes(qs.plan_handle)
                WHERE attribute = N'dbid') AS F_DB
    GROUP BY DatabaseID
)
SELECT DatabaseName AS [Database Name]
    , CPU_Time_Ms AS [CPU Time Ms]
    , CAST(CPU_Time_Ms * 1.0 / SUM(CPU_Time_Ms) OVER() * 100.0 AS DECIMAL(5, 2)) AS [CPU Percent]
FROM DB_CPU_Stats
WHERE DatabaseID != 32767
ORDER BY ROW_NUMBER() OVER(ORDER BY CPU_Time_Ms DESC) OPTION (RECOMPILE)"#,
);

// The scheduler monitor ring buffer keeps ~256 one-minute samples. The misspelled
// "SchedluerMonitorEvent" path is what pre-SP2 2005 builds emit.
pub const CPU_HISTORY: Template = Template::new(
    "cpu_history",
    r#"DECLARE @ts_now BIGINT
SELECT @ts_now = cpu_ticks / (cpu_ticks / ms_ticks)
FROM sys.dm_os_sys_info
;WITH ring AS
(
    SELECT
        record.value('(Record/@id)[1]', 'int') AS record_id,
        DATEADD(ms, -1 * (@ts_now - [timestamp]), GETDATE()) AS EventTime,
        100 - record.value('(Record/SchedulerMonitorEvent/SystemHealth/SystemIdle)[1]', 'int') AS system_cpu_utilization_post_sp2,
        record.value('(Record/SchedulerMonitorEvent/SystemHealth/ProcessUtilization)[1]', 'int') AS sql_cpu_utilization_post_sp2,
        100 - record.value('(Record/SchedluerMonitorEvent/SystemHealth/SystemIdle)[1]', 'int') AS system_cpu_utilization_pre_sp2,
        record.value('(Record/SchedluerMonitorEvent/SystemHealth/ProcessUtilization)[1]', 'int') AS sql_cpu_utilization_pre_sp2
    FROM (
        SELECT timestamp, CONVERT(XML, record) AS record
        FROM sys.dm_os_ring_buffers
        WHERE ring_buffer_type = 'RING_BUFFER_SCHEDULER_MONITOR'
            AND record LIKE '%<SystemHealth>%') AS t
), cte AS
(
    SELECT EventTime
        , CASE WHEN system_cpu_utilization_post_sp2 IS NOT NULL THEN system_cpu_utilization_post_sp2 ELSE system_cpu_utilization_pre_sp2 END AS system_cpu
        , CASE WHEN sql_cpu_utilization_post_sp2 IS NOT NULL THEN sql_cpu_utilization_post_sp2 ELSE sql_cpu_utilization_pre_sp2 END AS sql_cpu
    FROM ring
)
SELECT EventTime
    , system_cpu
    , CASE WHEN sql_cpu > system_cpu THEN sql_cpu / 2 ELSE sql_cpu END AS sql_cpu
FROM cte
ORDER BY EventTime DESC"#,
);

pub const BUFFER_BY_DATABASE: Template = Template::new(
    "buffer_by_database",
    r#"SELECT CASE WHEN database_id = 32767 THEN 'Resource' ELSE DB_NAME(database_id) END AS [Database]
    , COUNT(*) / 128 AS [Cached_Size]
FROM sys.dm_os_buffer_descriptors (NOLOCK)
GROUP BY database_id
ORDER BY [Cached_Size] DESC
OPTION (RECOMPILE)"#,
);

// Keeps the top waits that make up 99% of the total wait time.
pub const WAIT_STATISTICS: Template = Template::new(
    "wait_statistics",
    r#"WITH [Waits] AS
(
    SELECT
        [wait_type],
        [wait_time_ms] / 1000.0 AS [WaitS],
        ([wait_time_ms] - [signal_wait_time_ms]) / 1000.0 AS [ResourceS],
        [signal_wait_time_ms] / 1000.0 AS [SignalS],
        [waiting_tasks_count] AS [WaitCount],
        100.0 * [wait_time_ms] / SUM([wait_time_ms]) OVER() AS [Percentage],
        ROW_NUMBER() OVER(ORDER BY [wait_time_ms] DESC) AS [RowNum]
    FROM sys.dm_os_wait_stats
    WHERE [waiting_tasks_count] > 0
        {wait_type_filter}
)
SELECT
    MAX([W1].[wait_type]) AS [wait_type],
    CAST(MAX([W1].[WaitS]) AS DECIMAL(16,2)) AS [wait_time_s],
    CAST(MAX([W1].[ResourceS]) AS DECIMAL(16,2)) AS [Resource_S],
    CAST(MAX([W1].[SignalS]) AS DECIMAL(16,2)) AS [Signal_S],
    MAX([W1].[WaitCount]) AS [waiting_tasks_count],
    CAST(MAX([W1].[Percentage]) AS DECIMAL(5,2)) AS [pct],
    CAST((MAX([W1].[WaitS]) / MAX([W1].[WaitCount])) AS DECIMAL(16,4)) AS [AvgWait_S],
    CAST((MAX([W1].[ResourceS]) / MAX([W1].[WaitCount])) AS DECIMAL(16,4)) AS [AvgRes_S],
    CAST((MAX([W1].[SignalS]) / MAX([W1].[WaitCount])) AS DECIMAL(16,4)) AS [AvgSig_S]
FROM [Waits] AS [W1]
    INNER JOIN [Waits] AS [W2] ON [W2].[RowNum] <= [W1].[RowNum]
GROUP BY [W1].[RowNum]
HAVING SUM([W2].[Percentage]) - MAX([W1].[Percentage]) < 99;"#,
);

pub const ERROR_LOG: Template = Template::new(
    "error_log",
    r#"CREATE TABLE #ErrorLog
(
    LogDate DATETIME
    , ProcessInfo NVARCHAR(50)
    , vchMessage NVARCHAR(2000)
)

INSERT INTO #ErrorLog(LogDate, ProcessInfo, vchMessage)
EXEC master.dbo.xp_readerrorlog @log_file_number

DELETE FROM #ErrorLog
WHERE ProcessInfo = 'Logon'
    OR vchMessage LIKE 'Error: %, Severity: %, State: %.'
    {start_bound}
    {end_bound}
{informational_filter}
SELECT LogDate
    , ProcessInfo
    , RTRIM(LTRIM(vchMessage)) AS [Message]
FROM #ErrorLog
ORDER BY LogDate DESC

DROP TABLE #ErrorLog"#,
);

pub const FAILED_LOGINS: Template = Template::new(
    "failed_logins",
    r#"CREATE TABLE #LoginFailed
(
    LogDate DATETIME
    , ProcessInfo NVARCHAR(50)
    , vchMessage NVARCHAR(2000)
)

INSERT INTO #LoginFailed(LogDate, ProcessInfo, vchMessage)
EXEC master.dbo.xp_readerrorlog @log_file_number

SELECT LogDate
    , ProcessInfo
    , RTRIM(LTRIM(vchMessage)) AS [Message]
FROM #LoginFailed
WHERE (SUBSTRING(vchMessage, 1, 12) = 'Login failed'
    OR vchMessage LIKE '%SSPI%'
    OR ProcessInfo = 'Logon')
    {start_bound}
    {end_bound}
ORDER BY LogDate DESC

DROP TABLE #LoginFailed"#,
);

pub const TOP_PROCEDURES: Template = Template::new(
    "top_procedures",
    r#"SELECT TOP (@row_limit) CASE WHEN database_id = 32767 THEN 'Resource' ELSE DB_NAME(database_id) END AS [Database]
    , OBJECT_SCHEMA_NAME(object_id, database_id) + '.' + OBJECT_NAME(object_id, database_id) AS [Stored Procedure]
    , cached_time AS [Cached Time]
    , last_execution_time AS [Last Execution Time]
    , execution_count AS [Execution Count]
    , total_worker_time / execution_count AS [Average CPU]
    , total_elapsed_time / execution_count AS [Average Elapsed Time]
    , total_logical_reads / execution_count AS [Average Logical Reads]
    , total_logical_writes / execution_count AS [Average Logical Writes]
    , total_physical_reads / execution_count AS [Average Physical Reads]
FROM sys.dm_exec_procedure_stats (NOLOCK)
ORDER BY {order_by} DESC"#,
);

pub const TOP_QUERIES: Template = Template::new(
    "top_queries",
    r#"SELECT TOP (@row_limit) CASE WHEN qt.dbid = 32767 THEN 'Resource' ELSE DB_NAME(qt.dbid) END AS [Database]
    , SUBSTRING(qt.text, qs.statement_start_offset / 2 + 1, (CASE WHEN qs.statement_end_offset = -1 THEN LEN(CONVERT(NVARCHAR(MAX), qt.text)) * 2 ELSE qs.statement_end_offset END - qs.statement_start_offset) / 2) AS [Query]
    , execution_count AS [Execution Count]
    , total_worker_time / execution_count / 1000 AS [Average Worker Time]
    , total_physical_reads / execution_count AS [Average Physical Reads]
    , total_logical_reads / execution_count AS [Average Logical Reads]
    , total_logical_writes / execution_count AS [Average Logical Writes]
    , total_elapsed_time / execution_count / 1000 AS [Average Elapsed Time]
    , qt.text AS [Parent Query]
FROM sys.dm_exec_query_stats AS qs
    CROSS APPLY sys.dm_exec_sql_text(qs.sql_handle) AS qt
ORDER BY {order_by} DESC"#,
);

/// Run value of the 'Ole Automation Procedures' server option
pub const OLE_AUTOMATION_PROBE: Template = Template::new(
    "ole_automation_probe",
    r#"SELECT CAST(value_in_use AS INT) AS value_in_use
FROM sys.configurations
WHERE name = 'Ole Automation Procedures'"#,
);

pub const ALL: &[Template] = &[
    MACHINE_TYPE,
    LAST_RESTART,
    SERVICE_STATUS,
    LIVE_SESSIONS,
    WHO,
    BACKUP_HISTORY,
    SYSADMIN_MEMBERS,
    FILE_MAP,
    IO_STATISTICS,
    FREE_DISK_SPACE,
    FREE_DISK_SPACE_OLE,
    CPU_BY_DATABASE,
    CPU_HISTORY,
    BUFFER_BY_DATABASE,
    WAIT_STATISTICS,
    ERROR_LOG,
    FAILED_LOGINS,
    TOP_PROCEDURES,
    TOP_QUERIES,
    OLE_AUTOMATION_PROBE,
];

pub fn get(id: &str) -> Option<&'static Template> {
    ALL.iter().find(|t| t.id == id)
}
