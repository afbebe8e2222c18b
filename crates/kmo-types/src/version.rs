use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Raw identifiers as reported by the engine handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawVersion {
    pub major: u32,
    pub minor: u32,
    /// RTM, SP1, CU3, ...
    pub product_level: String,
    pub edition: String,
    /// Full build string, e.g. "13.0.5026.0"
    pub version_string: String,
}

/// A (major, minor) version threshold.
///
/// Ordering is numeric on major first, so 10.50 sorts after 10.0 and before 11.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionRequirement {
    pub major: u32,
    pub minor: u32,
}

impl VersionRequirement {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for VersionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Canonical version descriptor, resolved once per engine handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDescriptor {
    pub major: u32,
    pub minor: u32,
    pub product_level: String,
    pub edition: String,
    pub raw_version: String,
    /// Canonical product name ("Sql Server 2016") or the unknown-edition sentinel
    pub name: String,
}

impl VersionDescriptor {
    pub fn requirement(&self) -> VersionRequirement {
        VersionRequirement::new(self.major, self.minor)
    }

    /// `{name} {product level} {edition} ({raw version})`
    pub fn full_name(&self) -> String {
        format!(
            "{} {} {} ({})",
            self.name, self.product_level, self.edition, self.raw_version
        )
    }
}

/// Named feature gating whether an operation may be composed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// sys.dm_* views and sys.server_principals (2005+)
    DynamicManagementViews,
    /// sys.dm_exec_procedure_stats (2008+)
    ProcedureStats,
    /// sys.dm_server_services (2008 R2+)
    ServerServices,
    /// virtual_machine_type_desc in sys.dm_os_sys_info (2008 R2+)
    VirtualMachineInfo,
    /// 'Ole Automation Procedures' is enabled; probed, not version derived
    OleAutomation,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::DynamicManagementViews,
        Capability::ProcedureStats,
        Capability::ServerServices,
        Capability::VirtualMachineInfo,
        Capability::OleAutomation,
    ];

    /// Minimum engine version, or `None` for capabilities probed from server settings.
    pub const fn min_version(self) -> Option<VersionRequirement> {
        match self {
            Capability::DynamicManagementViews => Some(VersionRequirement::new(9, 0)),
            Capability::ProcedureStats => Some(VersionRequirement::new(10, 0)),
            Capability::ServerServices | Capability::VirtualMachineInfo => {
                Some(VersionRequirement::new(10, 50))
            }
            Capability::OleAutomation => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Capability::DynamicManagementViews => "dynamic_management_views",
            Capability::ProcedureStats => "procedure_stats",
            Capability::ServerServices => "server_services",
            Capability::VirtualMachineInfo => "virtual_machine_info",
            Capability::OleAutomation => "ole_automation",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capabilities of one engine instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    detected: VersionRequirement,
    capabilities: BTreeSet<Capability>,
}

impl CapabilitySet {
    /// Every version-threshold capability met by `major.minor`.
    pub fn for_version(major: u32, minor: u32) -> Self {
        let detected = VersionRequirement::new(major, minor);
        let capabilities = Capability::ALL
            .iter()
            .copied()
            .filter(|cap| matches!(cap.min_version(), Some(min) if detected >= min))
            .collect();

        Self {
            detected,
            capabilities,
        }
    }

    pub fn with_ole_automation(mut self, enabled: bool) -> Self {
        if enabled {
            self.capabilities.insert(Capability::OleAutomation);
        } else {
            self.capabilities.remove(&Capability::OleAutomation);
        }
        self
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn detected(&self) -> VersionRequirement {
        self.detected
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.capabilities.iter().copied()
    }
}

impl From<&VersionDescriptor> for CapabilitySet {
    fn from(descriptor: &VersionDescriptor) -> Self {
        CapabilitySet::for_version(descriptor.major, descriptor.minor)
    }
}

/// Physical or virtual host, from sys.dm_os_sys_info
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineKind {
    Physical,
    Virtual,
    Unknown,
}

impl fmt::Display for MachineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineKind::Physical => write!(f, "Physical server"),
            MachineKind::Virtual => write!(f, "Virtual server"),
            MachineKind::Unknown => write!(f, "Unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_ordering_is_numeric() {
        assert!(VersionRequirement::new(10, 50) > VersionRequirement::new(10, 0));
        assert!(VersionRequirement::new(10, 50) < VersionRequirement::new(11, 0));
        assert!(VersionRequirement::new(9, 0) < VersionRequirement::new(10, 0));
    }

    #[test]
    fn test_capabilities_for_2005() {
        let caps = CapabilitySet::for_version(9, 0);
        assert!(caps.supports(Capability::DynamicManagementViews));
        assert!(!caps.supports(Capability::ProcedureStats));
        assert!(!caps.supports(Capability::ServerServices));
        assert!(!caps.supports(Capability::OleAutomation));
    }

    #[test]
    fn test_capabilities_for_2008_and_r2() {
        let caps = CapabilitySet::for_version(10, 0);
        assert!(caps.supports(Capability::ProcedureStats));
        assert!(!caps.supports(Capability::VirtualMachineInfo));

        let caps = CapabilitySet::for_version(10, 50);
        assert!(caps.supports(Capability::VirtualMachineInfo));
        assert!(caps.supports(Capability::ServerServices));
    }

    #[test]
    fn test_unknown_future_version_meets_thresholds() {
        let caps = CapabilitySet::for_version(16, 0);
        assert!(caps.supports(Capability::ProcedureStats));
        assert!(caps.supports(Capability::ServerServices));
        assert_eq!(caps.detected().to_string(), "16.0");
    }

    #[test]
    fn test_ole_automation_is_never_version_derived() {
        let caps = CapabilitySet::for_version(16, 0);
        assert!(!caps.supports(Capability::OleAutomation));

        let caps = caps.with_ole_automation(true);
        assert!(caps.supports(Capability::OleAutomation));

        let caps = caps.with_ole_automation(false);
        assert!(!caps.supports(Capability::OleAutomation));
    }

    #[test]
    fn test_full_name_format() {
        let descriptor = VersionDescriptor {
            major: 13,
            minor: 0,
            product_level: "SP2".to_string(),
            edition: "Developer Edition (64-bit)".to_string(),
            raw_version: "13.0.5026.0".to_string(),
            name: "Sql Server 2016".to_string(),
        };

        assert_eq!(
            descriptor.full_name(),
            "Sql Server 2016 SP2 Developer Edition (64-bit) (13.0.5026.0)"
        );
    }

    #[test]
    fn test_machine_kind_labels() {
        assert_eq!(MachineKind::Physical.to_string(), "Physical server");
        assert_eq!(MachineKind::Virtual.to_string(), "Virtual server");
        assert_eq!(MachineKind::Unknown.to_string(), "Unknown");
    }
}
