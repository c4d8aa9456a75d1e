pub use contact_form::error_chain_fmt;

pub mod contact_form;
pub mod health_check;
pub mod static_pages;
