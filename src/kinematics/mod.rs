//!
//! Inverse kinematics: target positions into cable lengths
//!
//! The third cable of a three-cable rig is not a straight anchor-to-toolhead line. It runs over
//! a pulley near the origin before reaching the toolhead, so its length is modelled as the sum
//! of two straight segments instead of a single distance.
//!

pub mod error;

use std::fmt;
use std::str::FromStr;

use error::KinematicsError;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::hardware::MachineGeometry;
use crate::hardware::math::{cable_to_cartesian, distance, mm_to_steps, two_segment_length};

///
/// A toolhead target position in the working plane.
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Point2D {
        Point2D { x, y }
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Point2D { x, y }
    }
}

///
/// The cable lengths realising a position, in the unit of the machine geometry.
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CableLengths {
    Two { a1: f64, a2: f64 },
    Three { a1: f64, a2: f64, a3: f64 },
}

impl CableLengths {
    pub fn a1(&self) -> f64 {
        match self {
            CableLengths::Two { a1, .. } | CableLengths::Three { a1, .. } => *a1,
        }
    }

    pub fn a2(&self) -> f64 {
        match self {
            CableLengths::Two { a2, .. } | CableLengths::Three { a2, .. } => *a2,
        }
    }

    pub fn a3(&self) -> Option<f64> {
        match self {
            CableLengths::Two { .. } => None,
            CableLengths::Three { a3, .. } => Some(*a3),
        }
    }

    /// All lengths in cable order.
    pub fn to_vec(&self) -> Vec<f64> {
        match *self {
            CableLengths::Two { a1, a2 } => vec![a1, a2],
            CableLengths::Three { a1, a2, a3 } => vec![a1, a2, a3],
        }
    }

    ///
    /// Calculates the whole motor steps each cable needs to go from these lengths to `target`.
    /// Cables missing from either side (two against three) are skipped.
    ///
    /// # Parameters:
    /// - `target`: The lengths to move to
    /// - `steps_per_mm`: The stepper resolution, see `hardware::math::steps_per_mm`
    ///
    /// # Returns:
    /// - A vector of signed step counts, positive meaning payed out
    ///
    pub fn step_deltas(&self, target: &CableLengths, steps_per_mm: f64) -> Vec<i64> {
        self.to_vec()
            .iter()
            .zip(target.to_vec())
            .map(|(from, to)| mm_to_steps(to - from, steps_per_mm))
            .collect()
    }

    /// The first cable whose length is negative, infinite or NaN.
    fn first_invalid(&self) -> Option<(usize, f64)> {
        self.to_vec().into_iter().enumerate().find(|(_, length)| !length.is_finite() || *length < 0.)
    }
}

///
/// Selects which transform a caller wants. The two three-cable variants encode different
/// physical assumptions about the bottom pulley and are kept side by side.
///
/// - `TwoCable`: gravity-assisted rig, two top anchors
/// - `ThreeCableImproved`: third cable with pulley offsets applied
/// - `ThreeCableZeroG`: third cable with the bottom pulley at the origin and no offsets
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CableMode {
    TwoCable,
    ThreeCableImproved,
    ThreeCableZeroG,
}

impl CableMode {
    pub fn get_id(&self) -> &'static str {
        match self {
            CableMode::TwoCable => "two-cable",
            CableMode::ThreeCableImproved => "three-cable-improved",
            CableMode::ThreeCableZeroG => "three-cable-zero-g",
        }
    }

    pub fn cable_count(&self) -> usize {
        match self {
            CableMode::TwoCable => 2,
            CableMode::ThreeCableImproved | CableMode::ThreeCableZeroG => 3,
        }
    }
}

impl fmt::Display for CableMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get_id())
    }
}

impl FromStr for CableMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "two-cable" => Ok(CableMode::TwoCable),
            "three-cable-improved" => Ok(CableMode::ThreeCableImproved),
            "three-cable-zero-g" => Ok(CableMode::ThreeCableZeroG),
            other => Err(format!(
                "unknown cable mode `{}`, expected one of two-cable, three-cable-improved, three-cable-zero-g",
                other
            )),
        }
    }
}

///
/// Converts a position into the two top cable lengths. Total over all reals; NaN and infinity
/// propagate through untouched.
///
/// # Returns:
/// - A tuple of the K1 and K2 cable lengths, respectively
///
pub fn two_cable(point: Point2D, geometry: &MachineGeometry) -> (f64, f64) {
    let a1 = distance(point.as_tuple(), geometry.k1().as_tuple());
    let a2 = distance(point.as_tuple(), geometry.k2().as_tuple());

    (a1, a2)
}

///
/// Recovers the position hanging below the top anchors from the K1 and K2 cable lengths. This
/// inverts `two_cable` for every point on or below the anchor line.
///
/// # Returns:
/// - The toolhead position, with a NaN y when the cables cannot meet
///
pub fn two_cable_position(a1: f64, a2: f64, geometry: &MachineGeometry) -> Point2D {
    let (x, y) = cable_to_cartesian(a1, a2, *geometry.width(), *geometry.height());
    Point2D::new(x, y)
}

///
/// Three-cable transform with the geometry's offsets applied. The top cables lose
/// `delta_offset` and `gamma_offset`; the third cable is measured from a bottom pulley raised
/// by `omega_offset`.
///
/// # Returns:
/// - A tuple of the K1, K2 and K3 cable lengths, respectively
///
pub fn three_cable_improved(point: Point2D, geometry: &MachineGeometry) -> (f64, f64, f64) {
    let offsets = geometry.offsets();
    let (a1, a2) = two_cable(point, geometry);

    let a3 = two_segment_length(point.x, point.y - offsets.omega_offset(), geometry.k3().x);

    (a1 - offsets.delta_offset(), a2 - offsets.gamma_offset(), a3)
}

///
/// Three-cable transform with the bottom pulley exactly at the origin. Offsets are ignored.
///
/// # Returns:
/// - A tuple of the K1, K2 and K3 cable lengths, respectively
///
pub fn three_cable_zero_g(point: Point2D, geometry: &MachineGeometry) -> (f64, f64, f64) {
    let (a1, a2) = two_cable(point, geometry);
    let a3 = two_segment_length(point.x, point.y, geometry.k3().x);

    (a1, a2, a3)
}

///
/// Runs the transform selected by `mode`.
///
pub fn transform(mode: CableMode, point: Point2D, geometry: &MachineGeometry) -> CableLengths {
    match mode {
        CableMode::TwoCable => {
            let (a1, a2) = two_cable(point, geometry);
            CableLengths::Two { a1, a2 }
        }
        CableMode::ThreeCableImproved => {
            let (a1, a2, a3) = three_cable_improved(point, geometry);
            CableLengths::Three { a1, a2, a3 }
        }
        CableMode::ThreeCableZeroG => {
            let (a1, a2, a3) = three_cable_zero_g(point, geometry);
            CableLengths::Three { a1, a2, a3 }
        }
    }
}

///
/// A solver bound to one machine geometry. Holds no mutable state, so a single instance can be
/// shared across threads.
///
/// # Fields:
/// - `geometry`: The rig the solver computes lengths for
///
#[derive(Debug, Clone)]
pub struct Solver {
    geometry: MachineGeometry,
}

impl Solver {
    pub fn new(geometry: MachineGeometry) -> Solver {
        tracing::debug!(height = geometry.height(), width = geometry.width(), "created kinematics solver");
        Solver { geometry }
    }

    pub fn geometry(&self) -> &MachineGeometry {
        &self.geometry
    }

    ///
    /// Computes cable lengths without any validation. Never fails.
    ///
    pub fn transform(&self, mode: CableMode, point: Point2D) -> CableLengths {
        transform(mode, point, &self.geometry)
    }

    ///
    /// Computes cable lengths, rejecting positions the rig cannot realise.
    ///
    /// # Returns:
    /// - The cable lengths, if the position is finite, inside the configured envelope (when one
    ///   is set), and yields no negative length after offsets
    /// - `KinematicsError::InvalidPosition` otherwise
    ///
    pub fn try_transform(&self, mode: CableMode, point: Point2D) -> Result<CableLengths, KinematicsError> {
        let reject = |reason: String| {
            tracing::debug!(x = point.x, y = point.y, %mode, reason = reason.as_str(), "rejected position");
            KinematicsError::InvalidPosition { x: point.x, y: point.y, reason }
        };

        if !point.is_finite() {
            return Err(reject("coordinates must be finite".to_owned()));
        }

        if let Some(envelope) = self.geometry.envelope() {
            if !envelope.contains(point.x, point.y) {
                return Err(reject(format!(
                    "outside the reachable envelope x:[{}, {}] y:[{}, {}]",
                    envelope.min_x, envelope.max_x, envelope.min_y, envelope.max_y
                )));
            }
        }

        let lengths = self.transform(mode, point);
        if let Some((index, length)) = lengths.first_invalid() {
            return Err(reject(format!("cable {} would have unusable length {}", index + 1, length)));
        }

        Ok(lengths)
    }

    ///
    /// Recovers the toolhead position from any set of lengths, using the two top cables.
    ///
    pub fn position(&self, lengths: &CableLengths) -> Point2D {
        two_cable_position(lengths.a1(), lengths.a2(), &self.geometry)
    }

    ///
    /// Computes cable lengths for many points in parallel. The output order matches `points`.
    ///
    pub fn transform_many(&self, mode: CableMode, points: &[Point2D]) -> Vec<CableLengths> {
        tracing::trace!(count = points.len(), %mode, "batch transform");
        points.par_iter().map(|point| self.transform(mode, *point)).collect()
    }
}

impl Default for Solver {
    fn default() -> Self {
        Solver::new(MachineGeometry::default())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{Envelope, Offsets};

    const EPS: f64 = 1e-4;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn two_cable_reference_points() {
        let geometry = MachineGeometry::default();

        let (a1, a2) = two_cable(Point2D::new(9., 12.), &geometry);
        assert!(close(a1, 10.8167), "{}", a1);
        assert!(close(a2, 12.5300), "{}", a2);

        let (a1, a2) = two_cable(Point2D::new(20., 1.), &geometry);
        assert!(close(a1, 26.2488), "{}", a1);
        assert!(close(a2, 17.), "{}", a2);
    }

    #[test]
    fn zero_g_reference_point() {
        let (a1, a2, a3) = three_cable_zero_g(Point2D::new(9., 12.), &MachineGeometry::default());
        assert!(close(a1, 117f64.sqrt()));
        assert!(close(a2, 157f64.sqrt()));
        assert!(close(a3, 31.2788), "{}", a3);
    }

    #[test]
    fn improved_reference_point() {
        let (a1, a2, a3) = three_cable_improved(Point2D::new(9., 12.), &MachineGeometry::default());
        assert!(close(a1, 117f64.sqrt()));
        assert!(close(a2, 157f64.sqrt()));
        assert!(close(a3, 29.7690), "{}", a3);
    }

    #[test]
    fn improved_subtracts_top_offsets() {
        let geometry = MachineGeometry::default().with_offsets(Offsets::new(0.5, 0.25, 1.)).unwrap();
        let (a1, a2, _) = three_cable_improved(Point2D::new(9., 12.), &geometry);
        assert!(close(a1, 117f64.sqrt() - 0.5));
        assert!(close(a2, 157f64.sqrt() - 0.25));
    }

    #[test]
    fn improved_with_zero_omega_matches_zero_g_third_cable() {
        let geometry = MachineGeometry::default().with_offsets(Offsets::new(0., 0., 0.)).unwrap();
        let point = Point2D::new(4., 7.);
        assert!(close(three_cable_improved(point, &geometry).2, three_cable_zero_g(point, &geometry).2));
    }

    #[test]
    fn zero_at_first_anchor() {
        let geometry = MachineGeometry::default();
        let (a1, a2) = two_cable(Point2D::new(0., 18.), &geometry);
        assert_eq!(a1, 0.);
        assert!(close(a2, 20.));
    }

    #[test]
    fn mirror_symmetry() {
        let geometry = MachineGeometry::default();
        for (x, y) in [(0., 0.), (3., 16.), (9., 12.), (13.5, -4.), (25., 40.)] {
            let (a1, a2) = two_cable(Point2D::new(x, y), &geometry);
            let (m1, m2) = two_cable(Point2D::new(20. - x, y), &geometry);
            assert!(close(a1, m2));
            assert!(close(a2, m1));
        }
    }

    #[test]
    fn non_negative_and_triangle_inequality() {
        let geometry = MachineGeometry::default();
        let span = 20.;
        for i in -10..=30 {
            for j in -10..=30 {
                let (a1, a2) = two_cable(Point2D::new(i as f64, j as f64), &geometry);
                assert!(a1 >= 0. && a2 >= 0.);
                assert!(a1 + a2 >= span - 1e-9);
            }
        }
    }

    #[test]
    fn three_cable_lengths_non_negative() {
        let geometry = MachineGeometry::default();
        for i in -10..=30 {
            for j in -10..=30 {
                // quarter steps put points between the omega offset and the floor
                let point = Point2D::new(i as f64, j as f64 * 0.25);

                let (a1, a2, a3) = three_cable_zero_g(point, &geometry);
                assert!(a1 >= 0. && a2 >= 0. && a3 >= 0., "zero-g {:?}", point);

                let (a1, a2, a3) = three_cable_improved(point, &geometry);
                assert!(a1 >= 0. && a2 >= 0. && a3 >= 0., "improved {:?}", point);
            }
        }
    }

    #[test]
    fn improved_third_cable_below_bottom_pulley() {
        // y = 0 sits one unit below the pulley, so both legs see a drop of 1
        let (_, _, a3) = three_cable_improved(Point2D::new(9., 0.), &MachineGeometry::default());
        assert!(close(a3, 82f64.sqrt() + 122f64.sqrt()), "{}", a3);

        // mirrored about the pulley height the length is unchanged
        let (_, _, above) = three_cable_improved(Point2D::new(9., 2.), &MachineGeometry::default());
        assert!(close(a3, above));
    }

    #[test]
    fn position_inverts_two_cable() {
        let geometry = MachineGeometry::default();
        for (x, y) in [(9., 12.), (10., 12.), (11., 12.), (3., 16.), (20., 1.), (-4., 2.)] {
            let (a1, a2) = two_cable(Point2D::new(x, y), &geometry);
            let position = two_cable_position(a1, a2, &geometry);
            assert!(close(position.x, x) && close(position.y, y), "({}, {}) -> {:?}", x, y, position);
        }
    }

    #[test]
    fn solver_position_from_three_cables() {
        let solver = Solver::new(MachineGeometry::new(30., 40.).unwrap());
        let lengths = solver.transform(CableMode::ThreeCableZeroG, Point2D::new(12., 5.));
        let position = solver.position(&lengths);
        assert!(close(position.x, 12.) && close(position.y, 5.));
    }

    #[test]
    fn position_unreachable_lengths() {
        assert!(two_cable_position(2., 2., &MachineGeometry::default()).y.is_nan());
    }

    #[test]
    fn triangle_equality_on_anchor_segment() {
        let (a1, a2) = two_cable(Point2D::new(7., 18.), &MachineGeometry::default());
        assert!(close(a1 + a2, 20.));
    }

    #[test]
    fn non_finite_propagates() {
        let geometry = MachineGeometry::default();
        let (a1, a2) = two_cable(Point2D::new(f64::NAN, 1.), &geometry);
        assert!(a1.is_nan() && a2.is_nan());

        let (a1, _, a3) = three_cable_zero_g(Point2D::new(f64::INFINITY, 1.), &geometry);
        assert!(a1.is_infinite());
        assert!(a3.is_infinite() || a3.is_nan());
    }

    #[test]
    fn transform_dispatches_by_mode() {
        let geometry = MachineGeometry::default();
        let point = Point2D::new(9., 12.);

        assert!(matches!(transform(CableMode::TwoCable, point, &geometry), CableLengths::Two { .. }));

        let improved = transform(CableMode::ThreeCableImproved, point, &geometry);
        let zero_g = transform(CableMode::ThreeCableZeroG, point, &geometry);
        assert!(close(improved.a3().unwrap(), 29.7690));
        assert!(close(zero_g.a3().unwrap(), 31.2788));
        assert_eq!(improved.a1(), zero_g.a1());
    }

    #[test]
    fn custom_geometry_moves_anchors() {
        let geometry = MachineGeometry::new(10., 6.).unwrap();
        let lengths = transform(CableMode::ThreeCableZeroG, Point2D::new(3., 6.), &geometry);
        assert!(close(lengths.a1(), 5.));
        assert!(close(lengths.a2(), 5.));
        // 3-6 legs on both sides of the midline
        assert!(close(lengths.a3().unwrap(), 2. * 45f64.sqrt()));
    }

    #[test]
    fn mode_parse_and_display() {
        for mode in [CableMode::TwoCable, CableMode::ThreeCableImproved, CableMode::ThreeCableZeroG] {
            assert_eq!(mode.to_string().parse::<CableMode>(), Ok(mode));
        }
        assert!("four-cable".parse::<CableMode>().is_err());
        assert_eq!(CableMode::ThreeCableZeroG.cable_count(), 3);
    }

    #[test]
    fn mode_serde_names() {
        assert_eq!(serde_json::to_string(&CableMode::ThreeCableZeroG).unwrap(), "\"three-cable-zero-g\"");
        assert_eq!(serde_json::from_str::<CableMode>("\"two-cable\"").unwrap(), CableMode::TwoCable);
    }

    #[test]
    fn try_transform_accepts_reachable() {
        let solver = Solver::default();
        let lengths = solver.try_transform(CableMode::TwoCable, Point2D::new(9., 12.)).unwrap();
        assert_eq!(lengths, solver.transform(CableMode::TwoCable, Point2D::new(9., 12.)));
    }

    #[test]
    fn try_transform_rejects_non_finite() {
        let err = Solver::default().try_transform(CableMode::TwoCable, Point2D::new(f64::NAN, 1.));
        assert!(matches!(err, Err(KinematicsError::InvalidPosition { .. })));
    }

    #[test]
    fn try_transform_rejects_outside_envelope() {
        let geometry = MachineGeometry::default()
            .with_envelope(Envelope { min_x: 1., min_y: 1., max_x: 19., max_y: 17. })
            .unwrap();
        let solver = Solver::new(geometry);

        assert!(solver.try_transform(CableMode::ThreeCableZeroG, Point2D::new(10., 10.)).is_ok());
        assert!(solver.try_transform(CableMode::ThreeCableZeroG, Point2D::new(20., 1.)).is_err());
    }

    #[test]
    fn try_transform_rejects_negative_after_offsets() {
        let geometry = MachineGeometry::default().with_offsets(Offsets::new(5., 0., 1.)).unwrap();
        let solver = Solver::new(geometry);

        let err = solver.try_transform(CableMode::ThreeCableImproved, Point2D::new(0., 18.)).unwrap_err();
        let KinematicsError::InvalidPosition { reason, .. } = err;
        assert!(reason.contains("cable 1"));

        // the unvalidated path still returns the raw value
        assert!(close(solver.transform(CableMode::ThreeCableImproved, Point2D::new(0., 18.)).a1(), -5.));
    }

    #[test]
    fn try_transform_rejects_overflowing_lengths() {
        let solver = Solver::default();

        // finite coordinates whose squares overflow to infinity
        let err = solver.try_transform(CableMode::TwoCable, Point2D::new(1e200, 1.));
        assert!(matches!(err, Err(KinematicsError::InvalidPosition { .. })));
        assert!(solver.transform(CableMode::TwoCable, Point2D::new(1e200, 1.)).a1().is_infinite());

        assert!(solver.try_transform(CableMode::ThreeCableZeroG, Point2D::new(1., -1e300)).is_err());
    }

    #[test]
    fn try_transform_accepts_envelope_edges() {
        let geometry = MachineGeometry::default()
            .with_envelope(Envelope { min_x: 1., min_y: 1., max_x: 19., max_y: 17. })
            .unwrap();
        let solver = Solver::new(geometry);

        assert!(solver.try_transform(CableMode::ThreeCableImproved, Point2D::new(1., 1.)).is_ok());
        assert!(solver.try_transform(CableMode::ThreeCableImproved, Point2D::new(19., 17.)).is_ok());
        assert!(solver.try_transform(CableMode::ThreeCableImproved, Point2D::new(19., 17.000001)).is_err());
    }

    #[test]
    fn batch_keeps_order() {
        let solver = Solver::default();
        let points: Vec<Point2D> = (0..200).map(|i| Point2D::new(i as f64 * 0.1, 12.)).collect();

        let batch = solver.transform_many(CableMode::ThreeCableImproved, &points);
        assert_eq!(batch.len(), points.len());
        for (point, lengths) in points.iter().zip(batch) {
            assert_eq!(lengths, solver.transform(CableMode::ThreeCableImproved, *point));
        }
    }

    #[test]
    fn step_deltas_between_positions() {
        let solver = Solver::default();
        let from = solver.transform(CableMode::TwoCable, Point2D::new(0., 18.));
        let to = solver.transform(CableMode::TwoCable, Point2D::new(20., 18.));

        // left cable pays out 20, right reels in 20
        assert_eq!(from.step_deltas(&to, 10.), vec![200, -200]);
    }

    #[test]
    fn solver_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Solver>();
    }
}
