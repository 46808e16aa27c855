//! Named snapshots of the parameter table.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::synth::params::{ParamId, ParamSnapshot, PARAMS};

/// A named set of parameter values keyed by parameter symbol.
///
/// Symbols rather than indices are stored so presets survive parameters being
/// added or reordered. Unknown symbols are skipped when the preset is applied.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Preset {
    pub name: String,
    pub values: BTreeMap<String, f32>,
}

impl Preset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    /// Capture every parameter in `snapshot`.
    pub fn from_snapshot(name: impl Into<String>, snapshot: &ParamSnapshot) -> Self {
        let values = PARAMS
            .iter()
            .map(|info| (info.symbol.to_string(), snapshot.get(info.id)))
            .collect();
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn with(mut self, id: ParamId, value: f32) -> Self {
        self.values.insert(id.info().symbol.to_string(), value);
        self
    }

    pub fn get(&self, id: ParamId) -> Option<f32> {
        self.values.get(id.info().symbol).copied()
    }

    /// Known parameters in this preset.
    pub fn entries(&self) -> impl Iterator<Item = (ParamId, f32)> + '_ {
        self.values
            .iter()
            .filter_map(|(symbol, &value)| ParamId::from_symbol(symbol).map(|id| (id, value)))
    }
}
