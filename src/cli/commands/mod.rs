pub mod lesson;
pub mod summarize;
pub mod exam;
pub mod render;
