pub mod constants;
pub mod ephemerides;
pub mod footprint;
pub mod matching;
pub mod params;
pub mod photometry;
pub mod reachability;
pub mod refind;
pub mod refind_errors;
pub mod results;
pub mod schedule;
pub mod time;
pub mod tracklets;
pub mod variant_orbits;
pub mod windowing;
