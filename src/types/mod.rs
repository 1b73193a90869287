pub mod frequency;
pub mod period;
