pub mod alphabeta;
pub mod driver;
pub mod ordering;
pub mod tree;
