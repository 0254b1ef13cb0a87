//! Chromium (chromiumoxide) による Driver 実装

mod driver;

pub use driver::ChromeDriver;
