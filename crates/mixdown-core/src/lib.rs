pub mod compressor;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod envelope;
pub mod export;
pub mod filter;
pub mod fixtures;
pub mod mix;
pub mod model;
pub mod osc;
pub mod parity;
pub mod persistence;
pub mod render;
pub mod reverb;
pub mod time;
pub mod wav;

pub use config::MixdownConfig;
pub use diagnostics::{
    TelemetryGuard, init_tracing, init_tracing_from_config, init_tracing_with_options,
};
pub use engine::{ChannelLayout, Engine, EngineError, RenderSettings};
pub use mix::{mix_track, mix_track_mono, pan_gains};
pub use model::{
    BufferError, CompressorSpec, Envelope, Event, FilterKind, FilterSpec, Length, Position,
    ReverbSpec, Seconds, StereoBuffer, Track, Waveform,
};
pub use parity::{ParityReport, generate_parity_report};
pub use render::render_event;
pub use time::{BarBeatTick, Tempo};
