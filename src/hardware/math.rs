///
/// Straight-line distance between two points in the working plane. All values share the unit of
/// the machine geometry (usually millimetres).
///
/// # Parameters:
/// - `from`: The (x, y) of the first point
/// - `to`: The (x, y) of the second point
///
/// # Returns:
/// - The euclidean distance between the points, never negative for finite inputs
///
pub fn distance(from: (f64, f64), to: (f64, f64)) -> f64 {
    f64::sqrt(f64::powi(to.0 - from.0, 2) + f64::powi(to.1 - from.1, 2))
}

///
/// Length of a cable which is bent over an intermediate pulley, modelled as two straight
/// segments: from the bottom pulley to the toolhead, then from the toolhead to the anchor.
///
/// # Parameters:
/// - `x`: The horizontal position of the toolhead
/// - `y`: The vertical position of the toolhead, already corrected for any pulley offset
/// - `anchor_x`: The horizontal position of the anchor the cable ends at
///
/// # Returns:
/// - The summed length of both segments
///
pub fn two_segment_length(x: f64, y: f64, anchor_x: f64) -> f64 {
    let omega = anchor_x - x;

    f64::sqrt(f64::powi(x, 2) + f64::powi(y, 2)) + f64::sqrt(f64::powi(omega, 2) + f64::powi(y, 2))
}

///
/// Converts the two top cable lengths back into a position. Both anchors sit on the line
/// `y = anchor_height`, the left one at x = 0. The toolhead is taken to hang below that line,
/// which is the only side a two-cable rig can reach under gravity.
///
/// # Parameters:
/// - `left_length`: The length of the K1 cable
/// - `right_length`: The length of the K2 cable
/// - `anchor_interspace`: The horizontal distance between the two anchors
/// - `anchor_height`: The height of the anchor line above the bottom edge
///
/// # Returns:
/// - A tuple containing the x and y coordinates, respectively. y is NaN when the cables cannot meet
///
pub fn cable_to_cartesian(left_length: f64, right_length: f64, anchor_interspace: f64, anchor_height: f64) -> (f64, f64) {
    let x = (f64::powi(anchor_interspace, 2) + f64::powi(left_length, 2) - f64::powi(right_length, 2)) / (2. * anchor_interspace);
    let drop = f64::sqrt(f64::powi(left_length, 2) - f64::powi(x, 2));

    (x, anchor_height - drop)
}

/// The number of motor steps required for one revolution.
pub const DEFAULT_STEPS_PER_REV: f64 = 3200.;
/// The diameter of the pulley wheel, in millimetres.
pub const DEFAULT_WHEEL_DIAMETER: f64 = 12.63;

///
/// Calculates the number of steps required to pay out one millimetre of cable.
///
/// # Parameters:
/// - `steps_per_rev`: Motor steps per full revolution, microstepping included
/// - `wheel_diameter`: Diameter of the pulley wheel, in millimetres
///
/// # Returns:
/// - The required number of steps for the cable to move 1 millimetre
///
pub fn steps_per_mm(steps_per_rev: f64, wheel_diameter: f64) -> f64 {
    steps_per_rev / (std::f64::consts::PI * wheel_diameter)
}

///
/// Converts a cable length delta into whole motor steps, rounded to the nearest step.
///
pub fn mm_to_steps(mm: f64, steps_per_mm: f64) -> i64 {
    (mm * steps_per_mm).round() as i64
}

///
/// Calculates the length of cable moved by the given number of steps.
///
pub fn steps_to_mm(steps: i64, steps_per_mm: f64) -> f64 {
    (steps as f64) / steps_per_mm
}
