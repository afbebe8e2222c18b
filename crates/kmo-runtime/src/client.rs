use chrono::NaiveDateTime;
use kmo_engine::{Defaults, compose, compose_ole_automation_probe, detect, machine_kind_from_desc};
use kmo_types::{
    Capability, CapabilitySet, Cell, ComposedQuery, ErrorLogOptions, FailedLoginOptions,
    FileMapOptions, LiveSessionOptions, MachineKind, OperationId, OperationOptions, ResultTable,
    Result, TopProceduresOptions, TopQueriesOptions, VersionDescriptor, WaitStatisticsOptions,
};
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::executor::{self, map_handle_error};
use crate::handle::{EngineHandle, RawValue};

/// Diagnostic operations over one engine handle.
///
/// The version descriptor and capability set are resolved lazily on first use
/// and cached for the lifetime of this value; so is the OLE automation probe.
/// Failed resolutions are not cached. Concurrent first calls may both resolve,
/// which is harmless because resolution is deterministic.
pub struct Diagnostics<H> {
    handle: H,
    defaults: Defaults,
    version: OnceCell<(VersionDescriptor, CapabilitySet)>,
    ole_automation: OnceCell<bool>,
}

impl<H: EngineHandle> Diagnostics<H> {
    pub fn new(handle: H) -> Self {
        Self::with_defaults(handle, Defaults::default())
    }

    pub fn with_defaults(handle: H, defaults: Defaults) -> Self {
        Self {
            handle,
            defaults,
            version: OnceCell::new(),
            ole_automation: OnceCell::new(),
        }
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    fn resolved(&self) -> Result<&(VersionDescriptor, CapabilitySet)> {
        self.version.get_or_try_init(|| {
            let raw = self
                .handle
                .raw_version_identifiers()
                .map_err(|err| map_handle_error(err, ""))?;
            let (descriptor, capabilities) = detect(&raw);
            debug!(
                version = %descriptor.requirement(),
                name = %descriptor.name,
                edition = %descriptor.edition,
                "resolved engine version"
            );
            Ok((descriptor, capabilities))
        })
    }

    pub fn version(&self) -> Result<&VersionDescriptor> {
        Ok(&self.resolved()?.0)
    }

    /// Canonical name, e.g. "Sql Server 2014"; "Unknown edition" when unmapped
    pub fn version_name(&self) -> Result<String> {
        Ok(self.version()?.name.clone())
    }

    /// `{name} {product level} {edition} ({raw version})`
    pub fn version_full(&self) -> Result<String> {
        Ok(self.version()?.full_name())
    }

    /// Version-threshold capabilities, without the OLE automation probe
    pub fn capabilities(&self) -> Result<&CapabilitySet> {
        Ok(&self.resolved()?.1)
    }

    /// Whether 'Ole Automation Procedures' is enabled; probed once per handle.
    pub fn ole_automation_enabled(&self) -> Result<bool> {
        let capabilities = self.capabilities()?;
        self.ole_automation
            .get_or_try_init(|| {
                // sys.configurations is not there before 2005
                if !capabilities.supports(Capability::DynamicManagementViews) {
                    return Ok(false);
                }

                let probe = compose_ole_automation_probe()?;
                let raw = executor::execute(&self.handle, &probe)?;
                let enabled = match raw.first_value() {
                    Some(RawValue::Int(v)) => *v == 1,
                    Some(RawValue::Bool(b)) => *b,
                    Some(RawValue::Text(s)) => s.trim() == "1",
                    _ => {
                        info!("ole automation probe returned no value, assuming disabled");
                        false
                    }
                };
                debug!(enabled, "probed ole automation");
                Ok(enabled)
            })
            .copied()
    }

    fn capabilities_for(&self, operation: OperationId) -> Result<CapabilitySet> {
        let capabilities = self.capabilities()?.clone();
        if operation == OperationId::FreeDiskSpace {
            return Ok(capabilities.with_ole_automation(self.ole_automation_enabled()?));
        }
        Ok(capabilities)
    }

    /// Compose without executing, against this handle's capabilities.
    pub fn compose(
        &self,
        operation: OperationId,
        options: &OperationOptions,
    ) -> Result<ComposedQuery> {
        compose(operation, options, &self.capabilities_for(operation)?)
    }

    /// Compose, execute and normalize one operation.
    pub fn run(&self, operation: OperationId, options: &OperationOptions) -> Result<ResultTable> {
        let query = self.compose(operation, options)?;
        executor::execute_table(&self.handle, &query)
    }

    /// Run with this instance's default options.
    pub fn run_default(&self, operation: OperationId) -> Result<ResultTable> {
        self.run(operation, &self.defaults.options_for(operation))
    }

    /// Physical or virtual host; `Unknown` before 2008 R2 (no I/O) or on an empty probe.
    pub fn machine_kind(&self) -> Result<MachineKind> {
        if !self
            .capabilities()?
            .supports(Capability::VirtualMachineInfo)
        {
            info!("virtual machine info not available on this version, machine kind unknown");
            return Ok(MachineKind::Unknown);
        }

        let table = self.run(OperationId::MachineType, &OperationOptions::None)?;
        let desc = table
            .rows()
            .first()
            .and_then(|row| row.first())
            .and_then(Cell::as_str);
        let kind = machine_kind_from_desc(desc);
        if kind == MachineKind::Unknown {
            info!(rows = table.len(), "machine type probe inconclusive");
        }
        Ok(kind)
    }

    /// Creation time of tempdb, which is recreated on every service start.
    /// An approximation of the last restart, not an exact one.
    pub fn last_restart(&self) -> Result<Option<NaiveDateTime>> {
        let table = self.run(OperationId::LastRestart, &OperationOptions::None)?;
        let restart = table.rows().first().and_then(|row| match row.first() {
            Some(Cell::DateTime(dt)) => Some(*dt),
            _ => None,
        });
        if restart.is_none() {
            info!("tempdb creation date not found, last restart unknown");
        }
        Ok(restart)
    }

    pub fn service_status(&self) -> Result<ResultTable> {
        self.run(OperationId::ServiceStatus, &OperationOptions::None)
    }

    pub fn live_sessions(&self, options: &LiveSessionOptions) -> Result<ResultTable> {
        self.run(
            OperationId::LiveSessions,
            &OperationOptions::LiveSessions(options.clone()),
        )
    }

    pub fn who(&self) -> Result<ResultTable> {
        self.run(OperationId::Who, &OperationOptions::None)
    }

    pub fn backup_history(&self) -> Result<ResultTable> {
        self.run(OperationId::BackupHistory, &OperationOptions::None)
    }

    pub fn sysadmin_members(&self) -> Result<ResultTable> {
        self.run(OperationId::SysadminMembers, &OperationOptions::None)
    }

    pub fn file_map(&self, options: &FileMapOptions) -> Result<ResultTable> {
        self.run(
            OperationId::FileMap,
            &OperationOptions::FileMap(options.clone()),
        )
    }

    pub fn io_statistics(&self) -> Result<ResultTable> {
        self.run(OperationId::IoStatistics, &OperationOptions::None)
    }

    pub fn free_disk_space(&self) -> Result<ResultTable> {
        self.run(OperationId::FreeDiskSpace, &OperationOptions::None)
    }

    pub fn cpu_by_database(&self) -> Result<ResultTable> {
        self.run(OperationId::CpuByDatabase, &OperationOptions::None)
    }

    pub fn cpu_history(&self) -> Result<ResultTable> {
        self.run(OperationId::CpuHistory, &OperationOptions::None)
    }

    pub fn buffer_by_database(&self) -> Result<ResultTable> {
        self.run(OperationId::BufferByDatabase, &OperationOptions::None)
    }

    pub fn wait_statistics(&self, options: &WaitStatisticsOptions) -> Result<ResultTable> {
        self.run(
            OperationId::WaitStatistics,
            &OperationOptions::WaitStatistics(options.clone()),
        )
    }

    pub fn error_log(&self, options: &ErrorLogOptions) -> Result<ResultTable> {
        self.run(
            OperationId::ErrorLog,
            &OperationOptions::ErrorLog(options.clone()),
        )
    }

    pub fn failed_logins(&self, options: &FailedLoginOptions) -> Result<ResultTable> {
        self.run(
            OperationId::FailedLogins,
            &OperationOptions::FailedLogins(options.clone()),
        )
    }

    pub fn top_procedures(&self, options: &TopProceduresOptions) -> Result<ResultTable> {
        self.run(
            OperationId::TopProcedures,
            &OperationOptions::TopProcedures(options.clone()),
        )
    }

    pub fn top_queries(&self, options: &TopQueriesOptions) -> Result<ResultTable> {
        self.run(
            OperationId::TopQueries,
            &OperationOptions::TopQueries(options.clone()),
        )
    }
}
