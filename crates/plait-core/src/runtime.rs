//! Host-runtime integration facade and file-stream adapter.
//!
//! The driver only brackets execution of compiled output with the
//! runtime's init/teardown entry points; everything else about the
//! host lives behind these types.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Entry points into the host runtime, called once each around the
/// execution of compiled output.
pub trait HostRuntime {
    fn init(&mut self) -> Result<()>;
    fn shutdown(&mut self) -> Result<()>;
}

/// Runtime stub for pure compilation runs.
#[derive(Debug, Default)]
pub struct NullRuntime {
    initialized: bool,
}

impl NullRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl HostRuntime for NullRuntime {
    fn init(&mut self) -> Result<()> {
        self.initialized = true;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        self.initialized = false;
        Ok(())
    }
}

/// Default chunk size when feeding file contents to the host.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Chunked reader feeding a file's bytes to a host-side sink, the
/// shape the host's file analyzers consume input in.
#[derive(Debug)]
pub struct FileStream {
    path: PathBuf,
    chunk_size: usize,
}

impl FileStream {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Feed the file to `sink` chunk by chunk. Returns the total number
    /// of bytes fed. Stops at the first sink error.
    pub fn feed(&self, sink: &mut dyn FnMut(&[u8]) -> Result<()>) -> Result<u64> {
        let mut file = File::open(&self.path)?;
        let mut buf = vec![0u8; self.chunk_size];
        let mut total = 0u64;

        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            sink(&buf[..n])?;
            total += n as u64;
        }

        Ok(total)
    }
}
