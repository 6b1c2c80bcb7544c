//! Handling-unit identifiers
//!
//! `1` + `HHmmss` + `YYWW` + `V` + vendor code. Bound to wall-clock time at
//! the moment of the refresh; two refreshes inside one second collide.

use chrono::{Local, NaiveTime, Timelike};

pub const HU_PREFIX: char = '1';
pub const HU_SEPARATOR: char = 'V';
pub const HU_VENDOR_CODE: &str = "3000594";

/// Length of an identifier built from a well-formed `YYWW` code.
pub const HU_LENGTH: usize = 19;

pub fn hu_number(date_code: &str, time: NaiveTime) -> String {
    format!(
        "{HU_PREFIX}{:02}{:02}{:02}{date_code}{HU_SEPARATOR}{HU_VENDOR_CODE}",
        time.hour(),
        time.minute(),
        time.second(),
    )
}

pub fn current_hu_number(date_code: &str) -> String {
    hu_number(date_code, Local::now().time())
}
