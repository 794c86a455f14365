pub mod browser;
pub mod panels;
pub mod plot;
