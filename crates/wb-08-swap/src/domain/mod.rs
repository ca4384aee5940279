pub mod amounts;
pub mod params;
