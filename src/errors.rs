pub use crate::basis::{ClassifyError, ReconcileError, ReserveError};
pub use crate::client::{PoolError, SourceError, StatementClientError};
pub use crate::imports::ImportError;
pub use crate::model::{ConfigError, ConvertAmountError};
pub use crate::statement::StatementParseError;
