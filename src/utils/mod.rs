pub mod logging;
pub mod time_fmt;
