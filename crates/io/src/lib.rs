// View export

pub mod csv;
pub mod json;
