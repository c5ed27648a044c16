#![deny(missing_docs)]
#![doc = "Core traits and data types shared by the SMC-ABC crates: errors, seeding, provenance and the collaborator contracts."]

pub mod errors;
pub mod float;
pub mod model;
pub mod provenance;
pub mod rng;

pub use errors::{AbcError, ErrorInfo};
pub use model::{
    dataset_from_column, Dataset, Prior, Simulator, TracePoint, TraceSink, VariableSpec,
};
pub use provenance::{RunProvenance, SchemaVersion};
pub use rng::{derive_substream_seed, RngHandle};
