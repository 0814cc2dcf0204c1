use crate::util::stream_id::StreamId;
use std::path::PathBuf;

/// One image as seen by `list`, before any integrity checks.
#[derive(Clone, Debug)]
pub struct ImageRow {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub sequence: Option<u32>,
    pub stream_id: Option<StreamId>,
}
