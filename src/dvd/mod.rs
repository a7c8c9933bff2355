//! Bouncing-logo easter egg for Case Work countdowns
//!
//! The logo travels inside a rectangle like an old DVD screensaver, but
//! its path is solved in closed form so it arrives on a corner exactly at
//! scripted countdown thresholds. Position is always a pure function of
//! remaining time; nothing is integrated frame by frame.

pub mod billiard;
pub mod bounds;
pub mod sequencer;

pub use billiard::{SegmentPath, reflect_axis, solve_segment};
pub use bounds::{Corner, RectBounds};
pub use sequencer::{DvdConfig, FrameView, Impact, Phase, PhaseSequencer, SequencerEvent, TimedSegment};
