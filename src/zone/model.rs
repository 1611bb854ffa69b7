//! Zone geometry and properties, plus the persisted record format

use serde::{Deserialize, Serialize};

use crate::host::TriggerVolume;
use crate::util::vector::Vector;

/// Where a zone sends players on entry. Either half may be set on its own.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Teleport {
    pub origin: Option<Vector>,
    pub angles: Option<Vector>,
}

impl Teleport {
    pub fn is_set(&self) -> bool {
        self.origin.is_some() || self.angles.is_some()
    }
}

/// Mutable effects of a zone
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ZoneProperties {
    pub nojump: bool,
    pub noduck: bool,
    /// Maximum speed while inside; `None` means uncapped
    pub speed_cap: Option<f32>,
    pub teleport: Teleport,
    /// Replaces the player's base velocity on entry
    pub boost: Option<Vector>,
}

/// Axis-aligned box with movement properties.
///
/// `mins`/`maxs` come straight from the zone file and may be unsorted;
/// [`Zone::bounds`] gives the normalized box. Geometry is fixed once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    mins: Vector,
    maxs: Vector,
    pub properties: ZoneProperties,
}

impl Zone {
    /// Zone with no restrictions, teleport or boost
    pub fn new(mins: Vector, maxs: Vector) -> Self {
        Self {
            mins,
            maxs,
            properties: ZoneProperties::default(),
        }
    }

    /// Zone spanning two arbitrary corners, sorted per axis
    pub fn from_corners(a: Vector, b: Vector) -> Self {
        Self::new(a.component_min(&b), a.component_max(&b))
    }

    pub fn mins(&self) -> Vector {
        self.mins
    }

    pub fn maxs(&self) -> Vector {
        self.maxs
    }

    /// Midpoint of the two corners
    pub fn origin(&self) -> Vector {
        (self.mins + self.maxs) / 2.0
    }

    /// Sorted (mins, maxs)
    pub fn bounds(&self) -> (Vector, Vector) {
        (
            self.mins.component_min(&self.maxs),
            self.mins.component_max(&self.maxs),
        )
    }

    /// Engine volume centered on the zone origin
    pub fn trigger_volume(&self) -> TriggerVolume {
        let (mins, maxs) = self.bounds();
        let half = (maxs - mins) / 2.0;
        TriggerVolume {
            origin: self.origin(),
            mins: -half,
            maxs: half,
        }
    }
}

/// Top-level document of a per-map zone file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneFile {
    pub zones: Vec<Zone>,
}
