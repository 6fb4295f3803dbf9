pub mod http;

pub use http::SourceFetcher;
