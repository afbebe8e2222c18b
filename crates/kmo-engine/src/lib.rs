// Composition layer - turns an operation + options + detected capabilities into SQL text
// Nothing here talks to a server; execution lives in kmo-runtime

pub mod catalog;
pub mod compose;
pub mod fragments;
pub mod template;
pub mod templates;
pub mod version;
pub mod wait_types;

pub use catalog::{ColumnSpec, Defaults, DiagnosticOperation};
pub use compose::{compose, compose_default, compose_ole_automation_probe, quote_identifier};
pub use template::Template;
pub use version::{machine_kind_from_desc, parse_major_minor, resolve, version_name};
pub use wait_types::{DEFAULT_IGNORED_WAIT_TYPES, default_ignored_wait_types};

use kmo_types::{CapabilitySet, RawVersion, VersionDescriptor};

// Façade API - the runtime resolves once per handle and gates with the result

/// Resolve raw server identifiers into a descriptor and its capability set.
/// OLE automation is not part of the result; it is probed separately on demand.
pub fn detect(raw: &RawVersion) -> (VersionDescriptor, CapabilitySet) {
    let descriptor = resolve(raw);
    let capabilities = CapabilitySet::from(&descriptor);
    (descriptor, capabilities)
}
