pub mod config;
pub mod load;
pub mod queries;
pub mod report;
pub mod session;
pub mod write;

#[cfg(test)]
mod fixtures;
