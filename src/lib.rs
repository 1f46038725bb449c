pub mod config;
pub mod explore;
pub mod fetch;
pub mod input;
pub mod output;
pub mod unify;
