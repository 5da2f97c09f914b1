pub mod extensive;
pub mod report;
pub mod solve;
pub mod validate;
