pub mod action;
pub mod app;
pub mod components;
pub mod event;
pub mod theme;
pub mod ticker;

#[cfg(test)]
pub(crate) mod test_utils;

pub use app::App;
