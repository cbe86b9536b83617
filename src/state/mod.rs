pub mod convert;
pub mod data_model;
pub mod edit_session;
pub mod grid;
pub mod i18n;
