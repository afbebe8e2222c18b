pub mod error;
pub mod operation;
pub mod options;
pub mod query;
pub mod table;
pub mod version;

pub use error::{Error, ExecutionFailureKind, Result};
pub use operation::OperationId;
pub use options::*;
pub use query::{ComposedQuery, Parameter, SqlValue};
pub use table::{Cell, Column, ResultTable, Row, SemanticType};
pub use version::{
    Capability, CapabilitySet, MachineKind, RawVersion, VersionDescriptor, VersionRequirement,
};
