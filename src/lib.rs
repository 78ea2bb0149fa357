#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod input;
pub mod panels;
pub mod snapshot;
pub mod state;
pub mod stroke;
pub mod surface;
pub mod tool;

pub use app::SketchApp;
pub use config::SketchConfig;
pub use error::{ClipboardError, PersistenceError, SketchError, SketchResult};
pub use export::{ClipboardHost, ClipboardImage, DirectorySink, DownloadSink, ExportedImage, UnavailableClipboard};
pub use history::SnapshotHistory;
pub use input::{InputTranslator, PointerEvent, PointerPhase, StrokeSample, TouchEvent, TouchPhase};
pub use snapshot::Snapshot;
pub use state::{Canvas, HostServices, KeyValueStore, MemoryStore};
pub use stroke::{StrokeOutcome, StrokeRenderer};
pub use surface::Surface;
pub use tool::{ToolMode, ToolState};
