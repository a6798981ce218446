// Library root for the Chrome War game clock and rules.

pub mod clock;
pub mod countdown;
pub mod error;
pub mod lineup;
pub mod phase;
pub mod rules;
pub mod schedule;
pub mod timers;

pub use clock::{parse_instant, GamePhaseClock, GameStatus};
pub use countdown::{countdown_string, CLOSED};
pub use error::ClockError;
pub use phase::{entry_allowed, Phase};
pub use schedule::{ScheduleRule, ScheduleConfig};
pub use timers::WeekTimers;
