pub mod analysis;
pub mod media;
pub mod roster;
pub mod taxonomy;
