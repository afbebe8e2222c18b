use kmo_types::{MachineKind, RawVersion, VersionDescriptor};

/// Name used for any (major, minor) pair missing from the table
pub const UNKNOWN_EDITION: &str = "Unknown edition";

/// Exact-match (major, minor) → product name lookup
pub const VERSION_NAMES: &[((u32, u32), &str)] = &[
    ((13, 0), "Sql Server 2016"),
    ((12, 0), "Sql Server 2014"),
    ((11, 0), "Sql Server 2012"),
    ((10, 50), "Sql Server 2008 R2"),
    ((10, 0), "Sql Server 2008"),
    ((9, 0), "Sql Server 2005"),
    ((8, 0), "Sql Server 2000"),
    ((7, 0), "Sql Server 7"),
];

/// virtual_machine_type_desc → machine kind
const MACHINE_KINDS: &[(&str, MachineKind)] = &[
    ("NONE", MachineKind::Physical),
    ("HYPERVISOR", MachineKind::Virtual),
];

pub fn version_name(major: u32, minor: u32) -> &'static str {
    VERSION_NAMES
        .iter()
        .find(|(key, _)| *key == (major, minor))
        .map(|(_, name)| *name)
        .unwrap_or(UNKNOWN_EDITION)
}

/// Build the canonical descriptor. Never fails: unmapped pairs get the sentinel name.
pub fn resolve(raw: &RawVersion) -> VersionDescriptor {
    VersionDescriptor {
        major: raw.major,
        minor: raw.minor,
        product_level: raw.product_level.clone(),
        edition: raw.edition.clone(),
        raw_version: raw.version_string.clone(),
        name: version_name(raw.major, raw.minor).to_string(),
    }
}

/// Parse "13.0.5026.0" (or "10.50") into (major, minor).
pub fn parse_major_minor(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.trim().split('.');
    let major = parts.next()?.trim().parse().ok()?;
    let minor = match parts.next() {
        Some(part) => part.trim().parse().ok()?,
        None => 0,
    };
    Some((major, minor))
}

pub fn machine_kind_from_desc(desc: Option<&str>) -> MachineKind {
    let Some(desc) = desc else {
        return MachineKind::Unknown;
    };
    let desc = desc.trim();
    MACHINE_KINDS
        .iter()
        .find(|(key, _)| *key == desc)
        .map(|(_, kind)| *kind)
        .unwrap_or(MachineKind::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(major: u32, minor: u32) -> RawVersion {
        RawVersion {
            major,
            minor,
            product_level: "RTM".to_string(),
            edition: "Standard Edition".to_string(),
            version_string: format!("{}.{}.1000.0", major, minor),
        }
    }

    #[test]
    fn test_every_known_pair_maps_to_its_name() {
        for ((major, minor), name) in VERSION_NAMES {
            assert_eq!(resolve(&raw(*major, *minor)).name, *name);
        }
    }

    #[test]
    fn test_unknown_pairs_map_to_sentinel() {
        for (major, minor) in [(0, 0), (6, 5), (10, 25), (14, 0), (16, 0), (13, 1)] {
            assert_eq!(version_name(major, minor), UNKNOWN_EDITION);
        }
    }

    #[test]
    fn test_resolve_keeps_raw_identifiers() {
        let descriptor = resolve(&raw(10, 50));
        assert_eq!(descriptor.name, "Sql Server 2008 R2");
        assert_eq!(descriptor.raw_version, "10.50.1000.0");
        assert_eq!(
            descriptor.full_name(),
            "Sql Server 2008 R2 RTM Standard Edition (10.50.1000.0)"
        );
    }

    #[test]
    fn test_parse_major_minor() {
        assert_eq!(parse_major_minor("13.0.5026.0"), Some((13, 0)));
        assert_eq!(parse_major_minor("10.50"), Some((10, 50)));
        assert_eq!(parse_major_minor("9"), Some((9, 0)));
        assert_eq!(parse_major_minor("abc"), None);
        assert_eq!(parse_major_minor("13.x"), None);
    }

    #[test]
    fn test_machine_kind_mapping() {
        assert_eq!(machine_kind_from_desc(Some("NONE")), MachineKind::Physical);
        assert_eq!(machine_kind_from_desc(Some("HYPERVISOR")), MachineKind::Virtual);
        assert_eq!(machine_kind_from_desc(Some("CONTAINER")), MachineKind::Unknown);
        assert_eq!(machine_kind_from_desc(Some("")), MachineKind::Unknown);
        assert_eq!(machine_kind_from_desc(None), MachineKind::Unknown);
    }
}
