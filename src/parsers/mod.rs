pub mod occupancy3d;
pub mod writer;

pub use occupancy3d::{GridHeader, LayerOverflowPolicy, LoadedGrid, OccupancyGridLoader, load};
