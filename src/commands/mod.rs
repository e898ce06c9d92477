pub mod normalize;
pub mod reconcile;
pub mod segment;
pub mod status;
pub mod sync;
