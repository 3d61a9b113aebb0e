//! Records stored in a session's metadata log.
//!
//! A metadata log starts with one init record, followed by call records. Each call
//! record spans three lines:
//!
//! ```text
//! c 0                          header: call kind and its arguments
//! 0x7f12a000 100 0x7f12b010 50 call-site snapshot, written before forwarding
//! 100 40 0                     outcome, written after the call returned
//! ```

use crate::encoding::Fields;
use crate::error::{FormatError, FormatResult};
use crate::kind::StreamKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Page granularity preserved by replay
pub const PAGE_SIZE: usize = 0x1000;

/// Low-order pointer bits that replay reproduces
pub const PAGE_OFFSET_MASK: usize = PAGE_SIZE - 1;

/// Parameters of `deflateInit2_`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeflateParams {
    /// Compression level
    pub level: i32,
    /// Compression method (always `Z_DEFLATED` in practice)
    pub method: i32,
    /// Window size and wrapper selection
    pub window_bits: i32,
    /// Internal state memory level
    pub mem_level: i32,
    /// Compression strategy
    pub strategy: i32,
}

/// Reference from a cloned session to the point in its source it was forked at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineage {
    /// Source metadata file name, `<kind>.<pid>.<sequence>`
    pub source: String,
    /// Byte offset into the source metadata log at the moment of cloning
    pub offset: u64,
}

impl Lineage {
    /// Locate the source trace relative to the clone's own metadata file.
    ///
    /// Absolute sources are returned as-is.
    #[must_use]
    pub fn resolve(&self, clone_metadata: &Path) -> PathBuf {
        let source = Path::new(&self.source);
        if source.is_absolute() {
            return source.to_path_buf();
        }
        match clone_metadata.parent() {
            Some(dir) => dir.join(source),
            None => source.to_path_buf(),
        }
    }
}

/// How a session came into existence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum InitRecord {
    /// `deflateInit_`, written as `d 1 <level>`
    DeflateDefault {
        /// Compression level
        level: i32,
    },
    /// `deflateInit2_`, written as `d 2 <level> <method> <window_bits> <mem_level> <strategy>`
    DeflateExplicit(DeflateParams),
    /// `inflateInit_`, written as `i 1`
    InflateDefault,
    /// `inflateInit2_`, written as `i 2 <window_bits>`
    InflateExplicit {
        /// Window size and wrapper selection
        window_bits: i32,
    },
    /// `deflateCopy`/`inflateCopy`, written as `<d|i> c <source> <offset>`
    Clone {
        /// Direction of both source and clone
        kind: StreamKind,
        /// Where the clone was taken
        lineage: Lineage,
    },
}

impl InitRecord {
    /// Direction of the session
    #[must_use]
    pub fn kind(&self) -> StreamKind {
        match self {
            Self::DeflateDefault { .. } | Self::DeflateExplicit(_) => StreamKind::Deflate,
            Self::InflateDefault | Self::InflateExplicit { .. } => StreamKind::Inflate,
            Self::Clone { kind, .. } => *kind,
        }
    }

    /// Parse an init line (without its newline)
    ///
    /// # Errors
    ///
    /// Returns error if the line is not a well-formed init record
    pub fn parse(line: &str) -> FormatResult<Self> {
        let mut fields = Fields::new(line);
        let kind = StreamKind::from_tag(fields.text("kind")?)?;
        let method = fields.text("method")?;
        let record = match (kind, method) {
            (_, "c") => {
                let source = fields.text("source")?.to_string();
                let offset = fields.offset("offset")?;
                Self::Clone {
                    kind,
                    lineage: Lineage { source, offset },
                }
            }
            (StreamKind::Deflate, "1") => Self::DeflateDefault {
                level: fields.int("level")?,
            },
            (StreamKind::Deflate, "2") => Self::DeflateExplicit(DeflateParams {
                level: fields.int("level")?,
                method: fields.int("method")?,
                window_bits: fields.int("window_bits")?,
                mem_level: fields.int("mem_level")?,
                strategy: fields.int("strategy")?,
            }),
            (StreamKind::Inflate, "1") => Self::InflateDefault,
            (StreamKind::Inflate, "2") => Self::InflateExplicit {
                window_bits: fields.int("window_bits")?,
            },
            (_, other) => {
                return Err(FormatError::UnknownTag {
                    what: "init method",
                    tag: other.to_string(),
                });
            }
        };
        fields.finish()?;
        Ok(record)
    }
}

impl fmt::Display for InitRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.kind().tag();
        match self {
            Self::DeflateDefault { level } => write!(f, "{tag} 1 {level}"),
            Self::DeflateExplicit(p) => write!(
                f,
                "{tag} 2 {} {} {} {} {}",
                p.level, p.method, p.window_bits, p.mem_level, p.strategy
            ),
            Self::InflateDefault => write!(f, "{tag} 1"),
            Self::InflateExplicit { window_bits } => write!(f, "{tag} 2 {window_bits}"),
            Self::Clone { lineage, .. } => {
                write!(f, "{tag} c {} {}", lineage.source, lineage.offset)
            }
        }
    }
}

/// Entry point a call record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum CallKind {
    /// `deflate`/`inflate`, header `c <flush>`
    Step {
        /// Flush mode
        flush: i32,
    },
    /// `deflateParams`, header `p <level> <strategy>`
    Params {
        /// New compression level
        level: i32,
        /// New strategy
        strategy: i32,
    },
    /// `deflateReset`/`inflateReset`, header `r`
    Reset,
}

impl CallKind {
    /// Parse a call header line
    ///
    /// # Errors
    ///
    /// Returns error if the line is not a known call header
    pub fn parse(line: &str) -> FormatResult<Self> {
        let mut fields = Fields::new(line);
        let tag = fields.text("call").map_err(|_| FormatError::EmptyRecord)?;
        let kind = match tag {
            "c" => Self::Step {
                flush: fields.int("flush")?,
            },
            "p" => Self::Params {
                level: fields.int("level")?,
                strategy: fields.int("strategy")?,
            },
            "r" => Self::Reset,
            other => {
                return Err(FormatError::UnknownTag {
                    what: "call",
                    tag: other.to_string(),
                });
            }
        };
        fields.finish()?;
        Ok(kind)
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step { flush } => write!(f, "c {flush}"),
            Self::Params { level, strategy } => write!(f, "p {level} {strategy}"),
            Self::Reset => f.write_str("r"),
        }
    }
}

/// Buffer pointers and lengths offered to a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CallSite {
    /// Address of `next_in`
    pub next_in: usize,
    /// Input bytes offered
    pub avail_in: u32,
    /// Address of `next_out`
    pub next_out: usize,
    /// Output space offered
    pub avail_out: u32,
}

impl CallSite {
    /// Page offset of the input pointer
    #[must_use]
    pub const fn in_page_offset(&self) -> usize {
        self.next_in & PAGE_OFFSET_MASK
    }

    /// Page offset of the output pointer
    #[must_use]
    pub const fn out_page_offset(&self) -> usize {
        self.next_out & PAGE_OFFSET_MASK
    }

    /// Parse a snapshot line
    ///
    /// # Errors
    ///
    /// Returns error if the line is not `<ptr> <n> <ptr> <n>`
    pub fn parse(line: &str) -> FormatResult<Self> {
        let mut fields = Fields::new(line);
        let site = Self {
            next_in: fields.pointer("next_in")?,
            avail_in: fields.uint("avail_in")?,
            next_out: fields.pointer("next_out")?,
            avail_out: fields.uint("avail_out")?,
        };
        fields.finish()?;
        Ok(site)
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:#x} {} {:#x} {}",
            self.next_in, self.avail_in, self.next_out, self.avail_out
        )
    }
}

/// What a call did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Outcome {
    /// Input bytes consumed
    pub consumed_in: u32,
    /// Output bytes produced
    pub consumed_out: u32,
    /// Returned status code
    pub status: i32,
}

impl Outcome {
    /// Parse an outcome line
    ///
    /// # Errors
    ///
    /// Returns error if the line is not `<in> <out> <status>`
    pub fn parse(line: &str) -> FormatResult<Self> {
        let mut fields = Fields::new(line);
        let outcome = Self {
            consumed_in: fields.uint("consumed_in")?,
            consumed_out: fields.uint("consumed_out")?,
            status: fields.int("status")?,
        };
        fields.finish()?;
        Ok(outcome)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.consumed_in, self.consumed_out, self.status)
    }
}

/// One complete recorded call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Entry point and arguments
    pub kind: CallKind,
    /// Buffers offered
    pub site: CallSite,
    /// Observed result
    pub outcome: Outcome,
}
