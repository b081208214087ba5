//! The remap → shift → delete/select composition applied to class ids.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::LabelOpsError;

/// Additive shift applied to ids at or above `start`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShiftSpec {
    pub start: u32,
    pub value: i64,
    /// Shifted ids above this are dropped. `None` means unbounded.
    pub max: Option<u32>,
}

/// Final row filter. Delete and select cannot be combined.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassFilter {
    Delete(BTreeSet<u32>),
    Select(BTreeSet<u32>),
}

/// An immutable class-id transform. Absent stages are the identity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransformSpec {
    pub remap: BTreeMap<u32, u32>,
    pub shift: Option<ShiftSpec>,
    pub filter: Option<ClassFilter>,
}

impl TransformSpec {
    /// Build a spec from the CLI's textual pieces, validating it.
    pub fn from_args(
        class_mapping: Option<&str>,
        shift: Option<ShiftSpec>,
        delete_classes: Option<&str>,
        select_classes: Option<&str>,
    ) -> Result<Self, LabelOpsError> {
        let remap = match class_mapping {
            Some(raw) => parse_class_mapping(raw)?,
            None => BTreeMap::new(),
        };

        let filter = match (delete_classes, select_classes) {
            (Some(_), Some(_)) => return Err(LabelOpsError::ConflictingFilters),
            (Some(raw), None) => Some(ClassFilter::Delete(parse_class_list(raw)?)),
            (None, Some(raw)) => Some(ClassFilter::Select(parse_class_list(raw)?)),
            (None, None) => None,
        };

        let spec = Self {
            remap,
            shift,
            filter,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Reject shifts that would push an id at `start` below zero.
    pub fn validate(&self) -> Result<(), LabelOpsError> {
        if let Some(shift) = &self.shift {
            let Some(lowest) = i64::from(shift.start).checked_add(shift.value) else {
                return Err(LabelOpsError::InvalidShift {
                    message: format!(
                        "shifting class {} by {} overflows",
                        shift.start, shift.value
                    ),
                });
            };
            if lowest < 0 {
                return Err(LabelOpsError::InvalidShift {
                    message: format!(
                        "shifting class {} by {} gives {}; class ids cannot be negative",
                        shift.start, shift.value, lowest
                    ),
                });
            }
        }
        Ok(())
    }

    /// True when every stage is the identity.
    pub fn is_identity(&self) -> bool {
        self.remap.is_empty()
            && self.filter.is_none()
            && self.shift.map_or(true, |shift| shift.value == 0 && shift.max.is_none())
    }

    /// Run one class id through remap, shift, then the filter.
    /// `None` means the row is dropped.
    pub fn apply(&self, class_id: u32) -> Option<u32> {
        let mut id = i64::from(self.remap.get(&class_id).copied().unwrap_or(class_id));

        if let Some(shift) = &self.shift {
            if id >= i64::from(shift.start) {
                id = id.checked_add(shift.value)?;
                if let Some(max) = shift.max {
                    if id > i64::from(max) {
                        return None;
                    }
                }
            }
        }

        let id = u32::try_from(id).ok()?;

        match &self.filter {
            Some(ClassFilter::Delete(set)) if set.contains(&id) => None,
            Some(ClassFilter::Select(set)) if !set.contains(&id) => None,
            _ => Some(id),
        }
    }
}

impl fmt::Display for TransformSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if !self.remap.is_empty() {
            let pairs: Vec<String> = self
                .remap
                .iter()
                .map(|(from, to)| format!("{from}->{to}"))
                .collect();
            parts.push(format!("remap {}", pairs.join(",")));
        }

        if let Some(shift) = &self.shift {
            let max = shift
                .max
                .map(|max| format!(" (max {max})"))
                .unwrap_or_default();
            parts.push(format!("shift >={} by {:+}{}", shift.start, shift.value, max));
        }

        match &self.filter {
            Some(ClassFilter::Delete(set)) => parts.push(format!("delete {}", join_ids(set))),
            Some(ClassFilter::Select(set)) => parts.push(format!("select {}", join_ids(set))),
            None => {}
        }

        if parts.is_empty() {
            f.write_str("identity")
        } else {
            f.write_str(&parts.join("; "))
        }
    }
}

fn join_ids(set: &BTreeSet<u32>) -> String {
    set.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse `"a:b,c:d"` into a source → target map.
pub fn parse_class_mapping(raw: &str) -> Result<BTreeMap<u32, u32>, LabelOpsError> {
    let invalid = |message: String| LabelOpsError::InvalidClassMapping {
        input: raw.to_string(),
        message,
    };

    let mut mapping = BTreeMap::new();
    for pair in raw.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
        let (from, to) = pair
            .split_once(':')
            .ok_or_else(|| invalid(format!("'{pair}' is not of the form source:target")))?;

        let from = parse_class_id(from).map_err(&invalid)?;
        let to = parse_class_id(to).map_err(&invalid)?;

        if mapping.insert(from, to).is_some() {
            return Err(invalid(format!("class {from} is mapped more than once")));
        }
    }

    if mapping.is_empty() {
        return Err(invalid("no source:target pairs given".to_string()));
    }

    Ok(mapping)
}

/// Parse `"a,b,c"` into a set of class ids.
pub fn parse_class_list(raw: &str) -> Result<BTreeSet<u32>, LabelOpsError> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_class_id)
        .collect::<Result<BTreeSet<u32>, String>>()
        .map_err(|message| LabelOpsError::InvalidClassList {
            input: raw.to_string(),
            message,
        })?;

    if ids.is_empty() {
        return Err(LabelOpsError::InvalidClassList {
            input: raw.to_string(),
            message: "no class ids given".to_string(),
        });
    }

    Ok(ids)
}

fn parse_class_id(raw: &str) -> Result<u32, String> {
    let raw = raw.trim();
    raw.parse::<u32>()
        .map_err(|_| format!("'{raw}' is not a non-negative integer class id"))
}
