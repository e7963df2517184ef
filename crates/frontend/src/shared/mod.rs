pub mod api_utils;
pub mod modal;
pub mod storage;
