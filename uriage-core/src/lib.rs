//! uriage-core: types, configuration and the pure pipeline stages for
//! reconciling chat-style daily sales reports into a dated ledger.

pub mod block;
pub mod classify;
pub mod config;
pub mod date;
pub mod error;
pub mod format;
pub mod order;
pub mod store;

pub use block::{Block, ItemKind};
pub use classify::{LineClass, LineClassifier};
pub use config::{ConfigError, PipelineConfig};
pub use date::{parse_header_date, parse_report_date, serial_to_date};
pub use error::{CoreError, StoreNotFound};
pub use format::FieldFormatter;
pub use order::{order_blocks, IntraBlockOrderer};
pub use store::{StoreId, StoreResolver};
