pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetch;
pub mod labels;
pub mod load;
pub mod normalize;
pub mod schema;
pub mod sheet;
pub mod state;
pub mod table;
