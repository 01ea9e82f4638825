//! Background code tagging for completion and highlighting

pub mod debounce;
pub mod page;
pub mod parser;
pub mod pipeline;
pub mod snapshot;

pub use debounce::{Clock, Debouncer, ManualClock, SystemClock};
pub use page::{BufferPage, EditorPage};
pub use parser::{CodeParser, CtagsParser, parse_ctags_output};
pub use pipeline::{ParseOutcome, TagPipeline, TagsListener};
pub use snapshot::{SnapshotReport, TagSnapshot};
