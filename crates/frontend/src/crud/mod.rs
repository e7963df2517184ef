//! Generic CRUD grid: rendering, editing modal and the HTTP calls behind them.

pub mod api;
pub mod dispatcher;
pub mod form;
pub mod grid;
pub mod ui;
