//! Reason tags carried in `alert_trigger`, and the markers the alert
//! classifier looks for inside them.

pub const RUSH_HOUR: &str = "RUSH HOUR";
pub const WEATHER: &str = "WEATHER";
pub const HOT_ZONE: &str = "HOT ZONE";

pub const DQ_SHORT: &str = "DQ: SHORT";
pub const LONG: &str = "LONG";
pub const DQ_MISSING_DATA: &str = "DQ: MISSING DATA";

pub const STORM_STARTED: &str = "STORM STARTED";
pub const FREEZE_STARTED: &str = "FREEZE STARTED";

pub const MARKER_DQ: &str = "DQ";
pub const MARKER_STORM: &str = "STORM";
pub const MARKER_FREEZE: &str = "FREEZE";
