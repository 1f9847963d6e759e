pub mod flights;
pub mod similarity;
pub mod suggester;
