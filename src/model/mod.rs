pub mod calibration;
pub mod cohorts;
pub mod params;
pub mod profile;
pub mod result;
pub mod table;
