use futures::TryStreamExt;
use tokio_postgres::{Row, RowStream};

use crate::prelude::*;


/// Helper macro to pass arguments to `query_raw` and similar calls.
///
/// Helps you with casting to `&dyn ToSql` and type inference. Note: use `[]` for
/// the macro invocation, e.g. `dbargs![]`.
macro_rules! dbargs {
    () => {
        [] as [&(dyn postgres_types::ToSql + Sync); 0]
    };
    ($($arg:expr),+ $(,)?) => {
        [$($arg as &(dyn postgres_types::ToSql + Sync)),+]
    };
}

pub(crate) use dbargs;


/// Drains a row stream, converting each row with `f`.
pub(crate) async fn collect_rows<T>(
    stream: RowStream,
    f: impl FnMut(Row) -> T,
) -> Result<Vec<T>, tokio_postgres::Error> {
    stream.map_ok(f).try_collect().await
}
