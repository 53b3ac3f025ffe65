use thiserror::Error;

///
/// All errors emitted from validated transforms. The unvalidated transforms never fail.
///
/// - `InvalidPosition`: When a target cannot be realised by the cables
///     Parameters:
///     - `x`: The requested x coordinate
///     - `y`: The requested y coordinate
///     - `reason`: Why the position was rejected
///
#[derive(Error, Debug, PartialEq)]
pub enum KinematicsError {
    #[error("The position x:{} y:{} is invalid: {}", .x, .y, .reason)]
    InvalidPosition { x: f64, y: f64, reason: String },
}
