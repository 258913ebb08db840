mod binding;
mod commit;

pub(crate) use self::binding::BindingRow;
pub(crate) use self::commit::{ChangeRow, CommitRow};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use time::UtcDateTime;

/// Timestamps are stored as Unix nanoseconds so they survive a round trip
/// unchanged.
pub(crate) fn to_nanos(at: UtcDateTime) -> Result<i64> {
    i64::try_from(at.unix_timestamp_nanos()).or_raise(|| ErrorKind::InvalidData("timestamp"))
}

pub(crate) fn from_nanos(nanos: i64) -> Result<UtcDateTime> {
    UtcDateTime::from_unix_timestamp_nanos(i128::from(nanos)).or_raise(|| ErrorKind::InvalidData("timestamp"))
}
