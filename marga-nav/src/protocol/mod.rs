//! Inbound protocol: streaming JSON-lines commands and one-shot world exports.

mod commands;
mod export;

pub use commands::{
    Command, ConfigureData, Envelope, MineSetData, MineSpec, MissionRequest, PathRequest,
    SweepRequest,
};
pub use export::{ExportConfig, ExportMine, ExportPoint, WorldExport};
