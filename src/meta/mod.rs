//! FLIM metadata: header parameter groups, per-frame attributes and the
//! acquisition summary derived from them.

mod frame;
mod literal;
mod params;
mod summary;

pub use frame::{FrameInfo, TIMESTAMP_FORMAT, TIMESTAMP_KEY};
pub use literal::{parse_literal, ParamValue};
pub use params::{FlimParameters, GroupKind, ParameterGroup, HEADER_MARKER};
pub use summary::AcquisitionSummary;
