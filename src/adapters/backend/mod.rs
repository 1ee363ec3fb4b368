//! Backend adapter. Upload + assistant endpoints over HTTP.

pub mod http_backend;

pub use http_backend::HttpBackend;
