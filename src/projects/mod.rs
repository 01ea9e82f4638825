//! Project bookkeeping

pub mod recent;

pub use recent::RecentProjects;
