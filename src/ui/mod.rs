pub mod panels;
pub mod results;
