pub mod visibility;
pub mod wizard;
