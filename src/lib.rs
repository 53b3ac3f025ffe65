//!
//! Cable-length kinematics for two and three cable drawing machines
//!

pub mod demo;
pub mod hardware;
pub mod kinematics;

pub use hardware::MachineGeometry;
pub use kinematics::{CableLengths, CableMode, Point2D, Solver};
