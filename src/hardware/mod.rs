//!
//! Physical machine geometry and related handling
//!

pub mod error;
pub mod math;

use std::path::Path;

use error::GeometryError;
use serde::{Deserialize, Serialize};

/// Reference height of the top anchors above the bottom edge.
pub const REFERENCE_HEIGHT: f64 = 18.;
/// Reference horizontal distance between the top anchors.
pub const REFERENCE_WIDTH: f64 = 20.;

///
/// A fixed pulley location in the working plane.
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
}

impl Anchor {
    pub fn new(x: f64, y: f64) -> Anchor {
        Anchor { x, y }
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

///
/// Corrections for pulley radius and mounting, used by the improved three-cable transform.
/// All fields have an associated getter function.
///
/// # Fields:
/// - `delta_offset`: Subtracted from the first (top left) cable length
/// - `gamma_offset`: Subtracted from the second (top right) cable length
/// - `omega_offset`: Height of the bottom pulley, subtracted from y for the third cable
///
#[derive(getset::Getters, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[get = "pub"]
#[serde(default)]
pub struct Offsets {
    delta_offset: f64,
    gamma_offset: f64,
    omega_offset: f64,
}

impl Offsets {
    pub fn new(delta_offset: f64, gamma_offset: f64, omega_offset: f64) -> Offsets {
        Offsets { delta_offset, gamma_offset, omega_offset }
    }

    fn is_valid(&self) -> bool {
        [self.delta_offset, self.gamma_offset, self.omega_offset].iter().all(|v| v.is_finite())
    }
}

impl Default for Offsets {
    fn default() -> Self {
        Offsets { delta_offset: 0., gamma_offset: 0., omega_offset: 1. }
    }
}

///
/// An axis-aligned rectangle of positions in which the cables stay tensioned.
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Envelope {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    fn is_valid(&self) -> bool {
        [self.min_x, self.min_y, self.max_x, self.max_y].iter().all(|v| v.is_finite())
            && self.min_x <= self.max_x
            && self.min_y <= self.max_y
    }
}

///
/// The physical layout of a cable-driven machine. Coordinates have their origin at the bottom
/// left; the two top anchors sit at height `height`, `width` apart, and the third anchor sits
/// at the bottom right.
/// All features have an associated getter function.
///
/// # Fields:
/// - `height`: The vertical position of both top anchors
/// - `width`: The horizontal distance between the top anchors
/// - `offsets`: Pulley corrections for the improved three-cable transform
/// - `envelope`: Optional reachable region, only consulted by validated transforms
///
#[derive(getset::Getters, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[get = "pub"]
#[serde(try_from = "GeometryFile")]
pub struct MachineGeometry {
    height: f64,
    width: f64,
    offsets: Offsets,
    envelope: Option<Envelope>,
}

/// The on-disk form of a geometry, checked before it becomes a `MachineGeometry`.
#[derive(Deserialize)]
struct GeometryFile {
    height: f64,
    width: f64,
    #[serde(default)]
    offsets: Offsets,
    #[serde(default)]
    envelope: Option<Envelope>,
}

impl TryFrom<GeometryFile> for MachineGeometry {
    type Error = GeometryError;

    fn try_from(file: GeometryFile) -> Result<Self, Self::Error> {
        let geometry = MachineGeometry { height: file.height, width: file.width, offsets: file.offsets, envelope: file.envelope };
        geometry.validate()?;
        Ok(geometry)
    }
}

impl MachineGeometry {
    ///
    /// Creates a new geometry, rejecting dimensions no rig could have.
    ///
    /// # Parameters:
    /// - `height`: The vertical position of both top anchors
    /// - `width`: The horizontal distance between the top anchors
    ///
    /// # Returns:
    /// - A new `MachineGeometry` with default offsets and no envelope
    /// - A `GeometryError` if either dimension is non-finite or not positive
    ///
    pub fn new(height: f64, width: f64) -> Result<MachineGeometry, GeometryError> {
        let geometry = MachineGeometry { height, width, offsets: Offsets::default(), envelope: None };
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn with_offsets(mut self, offsets: Offsets) -> Result<MachineGeometry, GeometryError> {
        if !offsets.is_valid() {
            return Err(GeometryError::InvalidOffsets);
        }
        self.offsets = offsets;
        Ok(self)
    }

    pub fn with_envelope(mut self, envelope: Envelope) -> Result<MachineGeometry, GeometryError> {
        if !envelope.is_valid() {
            return Err(GeometryError::InvalidEnvelope);
        }
        self.envelope = Some(envelope);
        Ok(self)
    }

    ///
    /// Parses a geometry from its JSON representation, for example
    /// `{"height": 18.0, "width": 20.0, "offsets": {"omega_offset": 1.0}}`.
    ///
    pub fn from_json(json: &str) -> Result<MachineGeometry, GeometryError> {
        let file: GeometryFile = serde_json::from_str(json)?;
        let geometry = MachineGeometry::try_from(file)?;

        tracing::debug!(height = geometry.height, width = geometry.width, "parsed machine geometry");
        Ok(geometry)
    }

    ///
    /// Reads and parses a JSON geometry file.
    ///
    pub fn load(path: impl AsRef<Path>) -> Result<MachineGeometry, GeometryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|source| GeometryError::Io { path: path.display().to_string(), source })?;

        tracing::info!(path = %path.display(), "loading machine geometry");
        Self::from_json(&json)
    }

    /// Top left anchor, K1.
    pub fn k1(&self) -> Anchor {
        Anchor::new(0., self.height)
    }

    /// Top right anchor, K2.
    pub fn k2(&self) -> Anchor {
        Anchor::new(self.width, self.height)
    }

    /// Bottom right anchor, K3. Its y is always zero and no transform reads it.
    pub fn k3(&self) -> Anchor {
        Anchor::new(self.width, 0.)
    }

    fn validate(&self) -> Result<(), GeometryError> {
        for (name, value) in [("height", self.height), ("width", self.width)] {
            if !value.is_finite() || value <= 0. {
                return Err(GeometryError::InvalidDimension { name, value });
            }
        }

        if !self.offsets.is_valid() {
            return Err(GeometryError::InvalidOffsets);
        }

        match self.envelope {
            Some(envelope) if !envelope.is_valid() => Err(GeometryError::InvalidEnvelope),
            _ => Ok(()),
        }
    }
}

impl Default for MachineGeometry {
    /// The reference rig: anchors at (0, 18), (20, 18) and (20, 0).
    fn default() -> Self {
        MachineGeometry { height: REFERENCE_HEIGHT, width: REFERENCE_WIDTH, offsets: Offsets::default(), envelope: None }
    }
}
