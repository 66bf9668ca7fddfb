//! Error helpers shared by the shelfgate crates.
//!
//! Recovered errors are logged rather than propagated, so the interesting
//! part is usually the whole `source()` chain on a single line. See
//! [`FmtCompact`].

use std::{error, fmt, result};

pub type WhateverResult<T> = result::Result<T, snafu::Whatever>;

/// Displays an error followed by all its sources, separated with `: `
pub struct FmtCompactError<'e, E: ?Sized>(pub &'e E);

impl<E> fmt::Display for FmtCompactError<'_, E>
where
    E: error::Error + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{}", self.0))?;

        let mut source = self.0.source();
        while let Some(err) = source {
            f.write_fmt(format_args!(": {err}"))?;
            source = err.source();
        }

        Ok(())
    }
}

/// Like [`FmtCompactError`], but for an optional error (`-` when absent)
pub struct FmtCompactErrorOpt<'e, E: ?Sized>(pub Option<&'e E>);

impl<E> fmt::Display for FmtCompactErrorOpt<'_, E>
where
    E: error::Error + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(err) => FmtCompactError(err).fmt(f),
            None => f.write_str("-"),
        }
    }
}

pub trait FmtCompact {
    type Report: fmt::Display;
    fn fmt_compact(self) -> Self::Report;
}

impl<'e, E> FmtCompact for &'e E
where
    E: error::Error + ?Sized,
{
    type Report = FmtCompactError<'e, E>;

    fn fmt_compact(self) -> Self::Report {
        FmtCompactError(self)
    }
}

impl<'e, E> FmtCompact for Option<&'e E>
where
    E: error::Error + ?Sized,
{
    type Report = FmtCompactErrorOpt<'e, E>;

    fn fmt_compact(self) -> Self::Report {
        FmtCompactErrorOpt(self)
    }
}
