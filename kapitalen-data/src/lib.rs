mod schedule;

pub use schedule::{ScheduleLoader, ScheduleLoaderError, ScheduleRecord};
