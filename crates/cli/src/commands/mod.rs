// Subcommand implementations

pub mod ask;
pub mod cluster;
pub mod compare;
pub mod estimate;
pub mod load;
pub mod models;
pub mod scenarios;
