//! Violation reporting - the fatal path for ownership-discipline breaches.
//!
//! A violation is not an error value: nothing here is returned to callers of
//! the public API. The conflict rule produces a [`Violation`] internally so
//! the diagnostic can be assembled while the registry is still consistent,
//! and [`Violation::raise`] then writes the report and terminates the
//! process. The contract is "this indicates a bug in the calling code, fix
//! the code" - never "handle this at runtime".

use core::fmt;
use core::panic::Location;
use std::io::Write;

use crate::accessor::AccessMode;
use crate::registry::CellId;

/// The source location that constructed an access handle.
///
/// Captured via `#[track_caller]`, so the reported site is the caller that
/// created the handle, not a frame inside this crate. Purely diagnostic;
/// correctness never depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AccessSite {
    file: &'static str,
    line: u32,
    column: u32,
}

impl AccessSite {
    /// Captures the location of the (tracked) caller.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }

    /// Source file of the call site.
    #[must_use]
    pub const fn file(&self) -> &'static str {
        self.file
    }

    /// 1-based line of the call site.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// 1-based column of the call site.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }
}

impl From<&'static Location<'static>> for AccessSite {
    fn from(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for AccessSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A detected breach of the exclusive-writer / shared-readers discipline.
///
/// Every variant is fatal and raised through [`Violation::raise`]. The type
/// is public so the report formatting can be exercised in tests; it never
/// crosses the public API as a recoverable value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Violation {
    /// A write handle resolved while read handles were live on the same cell.
    WriteWhileRead {
        /// Site of the write handle that attempted to resolve.
        attempted: AccessSite,
        /// Sites of every currently resolved read handle.
        readers: Vec<AccessSite>,
    },
    /// A read handle resolved while a write handle was live on the same cell.
    ReadWhileWrite {
        /// Site of the read handle that attempted to resolve.
        attempted: AccessSite,
        /// Site of the currently resolved write handle.
        writer: AccessSite,
    },
    /// The registry's internal bookkeeping was found inconsistent.
    ///
    /// Unlike the two policy violations this signals a defect in the
    /// tracking mechanism itself (or a second exclusive writer reaching a
    /// record, which the record model treats with the same severity).
    InvariantBroken {
        /// Site of the handle involved, when one exists.
        attempted: Option<AccessSite>,
        /// What was found inconsistent.
        detail: &'static str,
    },
    /// A cell was destroyed while resolved handles were still live.
    DroppedWhileAccessed {
        /// Identity of the destroyed cell.
        cell: CellId,
        /// Sites of the read handles still attached.
        readers: Vec<AccessSite>,
        /// Site of the write handle still attached, if any.
        writer: Option<AccessSite>,
    },
    /// A handle resolved after its target cell was already destroyed.
    AccessorOutlivedCell {
        /// Site of the handle that attempted to resolve.
        attempted: AccessSite,
        /// Requested access kind.
        mode: AccessMode,
        /// Identity the handle was bound to.
        cell: CellId,
    },
}

impl Violation {
    /// Emits the diagnostic and terminates the process.
    ///
    /// The report goes to the real standard-error stream rather than through
    /// the `eprintln!` machinery, so it survives libtest output capture and
    /// is observable by a parent process right up to the abort.
    pub(crate) fn raise(self) -> ! {
        #[cfg(feature = "tracing")]
        tracing::error!(target: "warden", violation = %self, "ownership violation");

        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "warden: ownership violation: {self}");
        let _ = err.flush();
        std::process::abort();
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteWhileRead { attempted, readers } => {
                write!(
                    f,
                    "write access at {attempted} while {} read handle(s) are live",
                    readers.len()
                )?;
                for reader in readers {
                    write!(f, "\n  read handle at {reader}")?;
                }
                Ok(())
            }
            Self::ReadWhileWrite { attempted, writer } => {
                write!(
                    f,
                    "read access at {attempted} while a write handle at {writer} is live"
                )
            }
            Self::InvariantBroken { attempted, detail } => {
                write!(f, "access record invariant broken: {detail}")?;
                if let Some(site) = attempted {
                    write!(f, " (while resolving handle at {site})")?;
                }
                Ok(())
            }
            Self::DroppedWhileAccessed { cell, readers, writer } => {
                write!(
                    f,
                    "cell {cell} destroyed while access handles are live"
                )?;
                for reader in readers {
                    write!(f, "\n  read handle at {reader}")?;
                }
                if let Some(site) = writer {
                    write!(f, "\n  write handle at {site}")?;
                }
                Ok(())
            }
            Self::AccessorOutlivedCell { attempted, mode, cell } => {
                write!(
                    f,
                    "{mode} access at {attempted} to cell {cell}, which is no longer tracked"
                )
            }
        }
    }
}

impl std::error::Error for Violation {}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(line: u32, column: u32) -> AccessSite {
        AccessSite {
            file: "src/demo.rs",
            line,
            column,
        }
    }

    #[test]
    fn write_while_read_lists_every_reader() {
        let violation = Violation::WriteWhileRead {
            attempted: site(10, 9),
            readers: vec![site(7, 5), site(8, 5)],
        };
        let report = violation.to_string();
        assert!(report.contains("write access at src/demo.rs:10:9"));
        assert!(report.contains("2 read handle(s)"));
        assert!(report.contains("read handle at src/demo.rs:7:5"));
        assert!(report.contains("read handle at src/demo.rs:8:5"));
    }

    #[test]
    fn read_while_write_names_the_writer() {
        let violation = Violation::ReadWhileWrite {
            attempted: site(12, 13),
            writer: site(11, 13),
        };
        let report = violation.to_string();
        assert!(report.contains("read access at src/demo.rs:12:13"));
        assert!(report.contains("write handle at src/demo.rs:11:13"));
    }

    #[test]
    fn access_site_display_is_file_line_column() {
        assert_eq!(site(3, 4).to_string(), "src/demo.rs:3:4");
    }
}
