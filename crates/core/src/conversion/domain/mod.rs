pub mod conversion_error;
pub mod converter;
pub mod extension_stash;
pub mod field_reader;
pub mod provider_error;
