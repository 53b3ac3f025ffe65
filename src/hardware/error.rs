use thiserror::Error;

///
/// All errors emitted while building or loading a machine geometry.
/// The error messages can be displayed to users on the frontend. Format nicely please.
///
/// - `Io`: When the geometry file could not be read
///     Parameters:
///     - `path`: The path which was requested
///     - `source`: The underlying io error
/// - `Parse`: When the geometry file is not valid geometry JSON
/// - `InvalidDimension`: When a dimension is non-finite, or not strictly positive
///     Parameters:
///     - `name`: The name of the offending dimension
///     - `value`: The rejected value
/// - `InvalidOffsets`: When a pulley offset is NaN or infinite
/// - `InvalidEnvelope`: When the reachable envelope has a minimum above its maximum
///
#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("Unable to read machine geometry from {}: {}", .path, .source)]
    Io { path: String, source: std::io::Error },

    #[error("Machine geometry is not valid JSON: {}", .0)]
    Parse(#[from] serde_json::Error),

    #[error("The machine dimension `{}` must be a finite positive number, got {}", .name, .value)]
    InvalidDimension { name: &'static str, value: f64 },

    #[error("The pulley offsets must all be finite numbers")]
    InvalidOffsets,

    #[error("The reachable envelope is inverted or non-finite")]
    InvalidEnvelope,
}
