//!
//! Text output of sample transforms, for checking a rig by hand
//!

use std::io::Write;

use crate::kinematics::{CableLengths, CableMode, Point2D, Solver};

/// The points printed when no others are requested.
pub const SAMPLE_POINTS: [(f64, f64); 5] = [(9., 12.), (10., 12.), (11., 12.), (3., 16.), (20., 1.)];

const SEPARATOR: &str = "--------------------------";

pub fn sample_points() -> Vec<Point2D> {
    SAMPLE_POINTS.iter().copied().map(Point2D::from).collect()
}

///
/// Writes one labeled block: the input position, each cable length, then a separator line.
///
/// # Parameters:
/// - `out`: The sink to write to
/// - `point`: The position which was transformed
/// - `lengths`: The lengths computed for `point`
///
pub fn write_block<W: Write>(out: &mut W, point: Point2D, lengths: &CableLengths) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "x = {}", point.x)?;
    writeln!(out, "y = {}", point.y)?;
    for (index, length) in lengths.to_vec().iter().enumerate() {
        writeln!(out, "lengthA{} = {}", index + 1, length)?;
    }
    writeln!(out, "{}", SEPARATOR)
}

///
/// Transforms every point with `mode` and writes a block per point.
///
/// # Returns:
/// - The computed lengths, in the order of `points`
/// - An io error if the sink failed
///
pub fn run<W: Write>(out: &mut W, solver: &Solver, mode: CableMode, points: &[Point2D]) -> std::io::Result<Vec<CableLengths>> {
    let all_lengths = solver.transform_many(mode, points);

    for (point, lengths) in points.iter().zip(&all_lengths) {
        tracing::debug!(x = point.x, y = point.y, lengths = ?lengths.to_vec(), "sample");
        write_block(out, *point, lengths)?;
    }

    Ok(all_lengths)
}
