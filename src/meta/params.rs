//! Typed parameter groups parsed from the header description.
//!
//! The session header is a block of `key = value;` assignments, one per
//! line, after a fixed marker line. Each [`ParameterGroup`] keeps the
//! assignments whose key contains its prefix, with the value parsed by the
//! restricted literal grammar in [`super::literal`].
//!
//! A value that does not parse is not fatal: the field is skipped, a
//! warning is logged and the error is handed back to the caller alongside
//! the group.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::error::FlimError;

use super::literal::{parse_literal, ParamValue};

/// First line of every header description.
pub const HEADER_MARKER: &str = "FLIMimage parameters";

/// Separator between key and value on an assignment line.
pub(crate) const ASSIGNMENT: &str = " = ";

/// Statement terminator; everything from here on is dropped.
pub(crate) const TERMINATOR: char = ';';

static UNSET: ParamValue = ParamValue::Unset;

// =============================================================================
// GroupKind
// =============================================================================

/// The four recognized parameter groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Acquisition,
    PhotonCounting,
    Uncaging,
    MotorStage,
}

impl GroupKind {
    pub const ALL: [GroupKind; 4] = [
        GroupKind::Acquisition,
        GroupKind::PhotonCounting,
        GroupKind::Uncaging,
        GroupKind::MotorStage,
    ];

    /// Key prefix that selects lines for this group.
    pub const fn prefix(self) -> &'static str {
        match self {
            GroupKind::Acquisition => "State.Acq.",
            GroupKind::PhotonCounting => "State.Spc.",
            GroupKind::Uncaging => "State.Uncaging.",
            GroupKind::MotorStage => "State.Motor.",
        }
    }
}

/// Split an assignment line into key and raw value.
///
/// Returns `None` unless the line holds exactly one separator. The value is
/// cut at the first terminator.
pub(crate) fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split(ASSIGNMENT);
    let key = parts.next()?;
    let value = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let value = value.split(TERMINATOR).next().unwrap_or(value);
    Some((key, value))
}

// =============================================================================
// ParameterGroup
// =============================================================================

/// Fields of one group, keyed by the name after the prefix.
///
/// Fields that the file never mentions read back as [`ParamValue::Unset`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterGroup {
    kind: GroupKind,
    fields: BTreeMap<String, ParamValue>,
}

impl ParameterGroup {
    /// An empty group of the given kind.
    pub fn empty(kind: GroupKind) -> Self {
        Self {
            kind,
            fields: BTreeMap::new(),
        }
    }

    /// Parse `text` into a group, returning skipped-field errors as warnings.
    ///
    /// Fails with `MalformedHeader` when the first line is not
    /// [`HEADER_MARKER`]. Later assignments of the same field win.
    pub fn parse(kind: GroupKind, text: &str) -> Result<(Self, Vec<FlimError>), FlimError> {
        let mut lines = text.lines();
        match lines.next() {
            Some(first) if first.trim_end() == HEADER_MARKER => {}
            Some(first) => {
                return Err(FlimError::MalformedHeader {
                    reason: format!("expected {:?}, found {:?}", HEADER_MARKER, first),
                })
            }
            None => {
                return Err(FlimError::MalformedHeader {
                    reason: "header description is empty".to_string(),
                })
            }
        }

        let prefix = kind.prefix();
        let mut group = Self::empty(kind);
        let mut warnings = Vec::new();

        for line in lines {
            let Some((key, raw)) = split_assignment(line) else {
                continue;
            };
            let Some(at) = key.rfind(prefix) else {
                continue;
            };
            let name = &key[at + prefix.len()..];

            match parse_literal(raw) {
                Ok(value) => {
                    group.fields.insert(name.to_string(), value);
                }
                Err(message) => {
                    let field = format!("{}{}", prefix, name);
                    warn!(field = %field, prefix, error = %message, "Skipping unparseable header field");
                    warnings.push(FlimError::InvalidFieldValue { field, message });
                }
            }
        }

        Ok((group, warnings))
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    /// Number of fields recorded in the file.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over recorded fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Value of `name`, or `Unset` when absent.
    pub fn get(&self, name: &str) -> &ParamValue {
        self.fields.get(name).unwrap_or(&UNSET)
    }

    pub fn is_set(&self, name: &str) -> bool {
        !self.get(name).is_unset()
    }

    fn invalid(&self, name: &str, expected: &str, value: &ParamValue) -> FlimError {
        FlimError::InvalidFieldValue {
            field: format!("{}{}", self.kind.prefix(), name),
            message: format!("expected {}, found {} {}", expected, value.kind(), value),
        }
    }

    /// Integer field. Floats with no fractional part are accepted.
    pub fn get_int(&self, name: &str) -> Result<Option<i64>, FlimError> {
        match self.get(name) {
            ParamValue::Unset => Ok(None),
            ParamValue::Int(v) => Ok(Some(*v)),
            ParamValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Ok(Some(*v as i64)),
            other => Err(self.invalid(name, "an integer", other)),
        }
    }

    /// Non-negative integer field, for counts and sizes.
    pub fn get_usize(&self, name: &str) -> Result<Option<usize>, FlimError> {
        match self.get_int(name)? {
            None => Ok(None),
            Some(v) => usize::try_from(v)
                .map(Some)
                .map_err(|_| self.invalid(name, "a non-negative integer", self.get(name))),
        }
    }

    pub fn get_float(&self, name: &str) -> Result<Option<f64>, FlimError> {
        let value = self.get(name);
        if value.is_unset() {
            return Ok(None);
        }
        value
            .as_f64()
            .map(Some)
            .ok_or_else(|| self.invalid(name, "a number", value))
    }

    /// Boolean field. Integers are read as flags, zero being false.
    pub fn get_bool(&self, name: &str) -> Result<Option<bool>, FlimError> {
        match self.get(name) {
            ParamValue::Unset => Ok(None),
            ParamValue::Bool(v) => Ok(Some(*v)),
            ParamValue::Int(v) => Ok(Some(*v != 0)),
            other => Err(self.invalid(name, "a boolean", other)),
        }
    }

    pub fn get_str(&self, name: &str) -> Result<Option<&str>, FlimError> {
        match self.get(name) {
            ParamValue::Unset => Ok(None),
            ParamValue::Text(s) => Ok(Some(s)),
            other => Err(self.invalid(name, "a string", other)),
        }
    }

    /// Numeric sequence field. A lone number reads as a one-element list.
    pub fn get_float_seq(&self, name: &str) -> Result<Option<Vec<f64>>, FlimError> {
        match self.get(name) {
            ParamValue::Unset => Ok(None),
            ParamValue::Seq(items) => items
                .iter()
                .map(|item| {
                    item.as_f64()
                        .ok_or_else(|| self.invalid(name, "a sequence of numbers", item))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            other => other
                .as_f64()
                .map(|v| Some(vec![v]))
                .ok_or_else(|| self.invalid(name, "a sequence of numbers", other)),
        }
    }
}

// =============================================================================
// FlimParameters
// =============================================================================

/// All four groups of one header, plus the fields that had to be skipped.
#[derive(Debug, Clone, Serialize)]
pub struct FlimParameters {
    pub acquisition: ParameterGroup,
    pub photon_counting: ParameterGroup,
    pub uncaging: ParameterGroup,
    pub motor_stage: ParameterGroup,

    #[serde(skip)]
    warnings: Vec<FlimError>,
}

impl FlimParameters {
    pub fn parse(text: &str) -> Result<Self, FlimError> {
        let mut warnings = Vec::new();
        let mut parse_group = |kind| -> Result<ParameterGroup, FlimError> {
            let (group, skipped) = ParameterGroup::parse(kind, text)?;
            warnings.extend(skipped);
            Ok(group)
        };

        let acquisition = parse_group(GroupKind::Acquisition)?;
        let photon_counting = parse_group(GroupKind::PhotonCounting)?;
        let uncaging = parse_group(GroupKind::Uncaging)?;
        let motor_stage = parse_group(GroupKind::MotorStage)?;

        Ok(Self {
            acquisition,
            photon_counting,
            uncaging,
            motor_stage,
            warnings,
        })
    }

    pub fn group(&self, kind: GroupKind) -> &ParameterGroup {
        match kind {
            GroupKind::Acquisition => &self.acquisition,
            GroupKind::PhotonCounting => &self.photon_counting,
            GroupKind::Uncaging => &self.uncaging,
            GroupKind::MotorStage => &self.motor_stage,
        }
    }

    /// `InvalidFieldValue` errors for every skipped field, in group order.
    pub fn warnings(&self) -> &[FlimError] {
        &self.warnings
    }
}
