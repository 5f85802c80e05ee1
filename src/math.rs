pub mod mean;
pub mod vector;
