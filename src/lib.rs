//! Core of the Streamify client: preview synthesis for streamed videos and
//! schema-tolerant resolution of per-user resource sets.
//!
//! Pages ask [`resolver::resolve`] for a normalized id/object set, then feed a
//! list of [`media::MediaSource`]s to a [`pipeline::PreviewPipeline`] and
//! consume still-image previews in order as they complete.

pub mod cache;
pub mod error;
pub mod extractor;
pub mod ffmpeg;
pub mod media;
pub mod pipeline;
pub mod resolver;
pub mod shape;
pub mod transport;

pub use cache::{CacheKey, MemoryStore, PreviewStore};
pub use error::{ExtractError, TransportError};
pub use extractor::{ExtractionRequest, PreviewResult, extract};
pub use ffmpeg::{FfmpegOpener, FfmpegSession};
pub use media::{EncodedFrame, FrameOpener, FrameSource, MediaSource, SourceMetadata, VideoId};
pub use pipeline::{PreviewOptions, PreviewPipeline};
pub use resolver::{CandidateEndpoint, ResolvedSet, resolve};
pub use shape::{Shape, classify};
pub use transport::{HttpTransport, Transport};
