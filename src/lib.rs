// Tidemark watermarking library

pub mod batch;
pub mod logging;
pub mod server;
pub mod watermark;
