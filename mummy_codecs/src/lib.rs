mod passthrough;

pub use passthrough::NoopCodec;
