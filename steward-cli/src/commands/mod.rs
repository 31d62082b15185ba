pub mod check;
pub mod manage;
