//! Text rendering for the polling endpoint.

use crate::store::Reading;

/// Seconds after which overlay clients should re-fetch `/hr`.
pub const REFRESH_SECONDS: &str = "5";

/// Renders the reading as a whole number of beats per minute.
pub fn bpm_text(reading: &Reading) -> String {
    reading.bpm().to_string()
}
