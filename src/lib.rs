pub mod analyzers;
pub mod ingest;
pub mod output;
pub mod record;
