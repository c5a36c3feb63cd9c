// Entity Models
//
// Catalog records are values: loaded once, shared by reference, never edited.
// Optional seed fields are normalized when a record is deserialized.

pub mod college;

pub use college::{BranchCutoff, College, Fees, PlacementStats, Rank, Rankings, NOT_AVAILABLE};
