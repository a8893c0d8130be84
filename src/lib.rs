pub mod config;
pub mod converters;
pub mod dir;
pub mod error;
pub mod experiment;
pub mod genes;
pub mod intern;
pub mod item;
pub mod resolver;
pub mod run;
pub mod table;
