pub mod dispatcher;

pub use dispatcher::{Dispatcher, Firing, ScheduleConfig, TaskKind};
