//! Stabilize - motion detection for video stabilization
//!
//! Measures the translation and rotation between consecutive frames of a
//! video and writes them as a transform stream, one record per frame, for
//! a later compensation pass.
//!
//! # Architecture
//!
//! - `frame`: decoded frames and the plane view the estimator reads
//! - `filter`: the `Filter` trait and the stabilization detector
//! - `format`: Y4M and raw frame input, Y4M output
//! - `util`: plane storage, pixel formats and timestamps
//!
//! # Example
//!
//! ```no_run
//! use stabilize_lib::filter::stabilize::{MemorySink, StabilizeFilter, StabilizeOptions};
//! use stabilize_lib::format::{FrameReader, Y4mReader};
//! use stabilize_lib::Error;
//!
//! # fn main() -> stabilize_lib::Result<()> {
//! let mut input = Y4mReader::open("clip.y4m".as_ref())?;
//! let (width, height, format) = input.geometry();
//!
//! let sink = MemorySink::new();
//! let mut detector = StabilizeFilter::new("shakiness=6:accuracy=9".parse()?);
//! detector.configure(width, height, format, Box::new(sink.clone()))?;
//! loop {
//!     match input.read_frame() {
//!         Ok(frame) => {
//!             detector.process(frame)?;
//!         }
//!         Err(Error::EndOfStream) => break,
//!         Err(e) => return Err(e),
//!     }
//! }
//! detector.stop()?;
//! println!("{} transforms", sink.records().len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod filter;
pub mod format;
pub mod frame;
pub mod util;

pub use error::{Error, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Maximum number of threads used for parallel field matching
    pub max_threads: Option<usize>,
    /// Enable verbose logging
    pub verbose: bool,
    /// Enable debug output
    pub debug: bool,
}

/// Initialize logging and the thread pool
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init(config: Config) -> Result<()> {
    if let Some(threads) = config.max_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(|e| Error::Init(format!("Failed to initialize thread pool: {}", e)))?;
    }

    if config.verbose || config.debug {
        let level = if config.debug { "debug" } else { "info" };
        // a subscriber installed by the host application wins
        let _ = tracing_subscriber::fmt()
            .with_env_filter(level)
            .with_writer(std::io::stderr)
            .try_init();
    }

    Ok(())
}
