//! Indoor air advisor: reacts to new sensor readings with plain-language
//! advice about temperature, humidity and air quality.

pub mod advice;
pub mod advisor;
pub mod config;
pub mod database;
pub mod error;
pub mod listener;
pub mod models;
pub mod utils;

pub use advisor::{handle_new_reading, AdviceSink, Advisor, ReadingLog};
pub use error::{AdvisorError, Result};
pub use models::{Advice, AveragedWindow, Reading};
