pub mod entrance;
pub mod filler;
pub mod line;
pub mod point;
