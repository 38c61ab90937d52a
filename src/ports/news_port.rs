//! News headline source port.

use crate::domain::error::StockevalError;
use crate::domain::news::NewsItem;

/// One upstream headline provider.
///
/// A source is queried once per stock. Any failure (network, non-200 status,
/// unparseable payload) is returned as an error; the caller treats it as a
/// soft failure and continues with the remaining sources.
pub trait NewsSource {
    /// Short identifier used in logs and the report, e.g. `sina`.
    fn name(&self) -> &str;

    fn fetch(&self, symbol: &str) -> Result<Vec<NewsItem>, StockevalError>;
}
