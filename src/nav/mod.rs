pub mod great_circle;

pub use great_circle::{angle_between_headings, bearing, clip, distance, distance_on, KERBIN_RADIUS};
