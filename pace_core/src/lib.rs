//! lifepace core
//!
//! Fixed-rate frame pacing for a display-driven loop: the host ticks once
//! per display frame, the [`FixedRateScheduler`] forwards a bounded-rate
//! subset of those ticks to the frame callback.

pub mod clock;
pub mod config;
pub mod error;
pub mod frame;
pub mod frame_loop;
pub mod host;
pub mod logging;
pub mod schedule;
pub mod scheduler;
pub mod signals;
pub mod task;
pub mod telemetry;
pub mod time;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{load_config_toml, ErrorPolicy, HostKind, PaceConfig};
pub use error::{PaceError, PaceResult};
pub use frame_loop::{FrameLoop, LoopControl};
pub use scheduler::{FixedRateScheduler, FrameCallback, TickOutcome};
pub use signals::StopToken;
