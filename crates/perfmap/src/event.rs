use crate::Error;
use bitflags::bitflags;
use itertools::Itertools;
use std::{fmt, str::FromStr};

/// Category of the code object a [`CodeEvent`] pertains to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CodeKind {
    Builtin,
    Callback,
    Eval,
    Function,
    InterpretedFunction,
    Handler,
    BytecodeHandler,
    LazyCompile,
    RegExp,
    Script,
    Stub,
    Relocation,
}

impl CodeKind {
    pub const ALL: [CodeKind; 12] = [
        CodeKind::Builtin,
        CodeKind::Callback,
        CodeKind::Eval,
        CodeKind::Function,
        CodeKind::InterpretedFunction,
        CodeKind::Handler,
        CodeKind::BytecodeHandler,
        CodeKind::LazyCompile,
        CodeKind::RegExp,
        CodeKind::Script,
        CodeKind::Stub,
        CodeKind::Relocation,
    ];

    /// Tag name as it appears in the perf map.
    pub const fn as_str(self) -> &'static str {
        match self {
            CodeKind::Builtin => "Builtin",
            CodeKind::Callback => "Callback",
            CodeKind::Eval => "Eval",
            CodeKind::Function => "Function",
            CodeKind::InterpretedFunction => "InterpretedFunction",
            CodeKind::Handler => "Handler",
            CodeKind::BytecodeHandler => "BytecodeHandler",
            CodeKind::LazyCompile => "LazyCompile",
            CodeKind::RegExp => "RegExp",
            CodeKind::Script => "Script",
            CodeKind::Stub => "Stub",
            CodeKind::Relocation => "Relocation",
        }
    }
}

impl fmt::Display for CodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnknownKind(s.to_owned()))
    }
}

bitflags! {
    /// A set of [`CodeKind`]s.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KindSet: u16 {
        const BUILTIN = 1 << 0;
        const CALLBACK = 1 << 1;
        const EVAL = 1 << 2;
        const FUNCTION = 1 << 3;
        const INTERPRETED_FUNCTION = 1 << 4;
        const HANDLER = 1 << 5;
        const BYTECODE_HANDLER = 1 << 6;
        const LAZY_COMPILE = 1 << 7;
        const REG_EXP = 1 << 8;
        const SCRIPT = 1 << 9;
        const STUB = 1 << 10;
        const RELOCATION = 1 << 11;
    }
}

impl KindSet {
    /// Parse kind names. Any name outside the closed set is an error.
    pub fn from_names<I, S>(names: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().try_fold(Self::empty(), |set, name| {
            let kind: CodeKind = name.as_ref().parse()?;
            Ok(set | kind.into())
        })
    }

    #[inline]
    pub fn contains_kind(self, kind: CodeKind) -> bool {
        self.contains(kind.into())
    }

    pub fn kinds(self) -> impl Iterator<Item = CodeKind> {
        CodeKind::ALL
            .into_iter()
            .filter(move |kind| self.contains_kind(*kind))
    }
}

impl From<CodeKind> for KindSet {
    fn from(kind: CodeKind) -> Self {
        Self::from_bits_retain(1 << kind as u16)
    }
}

impl FromIterator<CodeKind> for KindSet {
    fn from_iter<T: IntoIterator<Item = CodeKind>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |set, kind| set | kind.into())
    }
}

impl fmt::Display for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kinds().join(","))
    }
}

/// A code-lifecycle notification: a code object was created, moved or
/// removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeEvent {
    pub kind: CodeKind,

    /// Start of the code object at the time of the event.
    pub address: u64,

    /// Start before the event. Equal to `address` unless the code moved.
    pub previous_address: u64,

    /// Length of the code region in bytes.
    pub size: u64,

    /// Free-text label attached by the runtime. May be empty.
    pub comment: String,

    /// May be empty for anonymous or synthetic code.
    pub function_name: String,

    /// Source file or resource. May be empty.
    pub script_name: String,

    /// 1-based, only meaningful when `script_name` is set.
    pub line: u32,

    /// 1-based, only meaningful when `script_name` is set.
    pub column: u32,
}

impl CodeEvent {
    pub fn new(kind: CodeKind, address: u64, size: u64) -> Self {
        Self {
            kind,
            address,
            previous_address: address,
            size,
            comment: String::new(),
            function_name: String::new(),
            script_name: String::new(),
            line: 0,
            column: 0,
        }
    }

    pub fn with_previous_address(mut self, previous_address: u64) -> Self {
        self.previous_address = previous_address;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_function_name(mut self, function_name: impl Into<String>) -> Self {
        self.function_name = function_name.into();
        self
    }

    pub fn with_script(mut self, script_name: impl Into<String>, line: u32, column: u32) -> Self {
        self.script_name = script_name.into();
        self.line = line;
        self.column = column;
        self
    }

    /// Whether the code object moved.
    pub fn is_relocation(&self) -> bool {
        self.previous_address != self.address
    }
}

/// Parse one line of a recorded event log.
///
/// Fields are tab-separated, in order: `kind address previous_address size
/// comment function_name script_name line column`. Addresses and sizes are
/// hexadecimal with an optional `0x` prefix, `line` and `column` decimal.
///
/// Only the kind is required. Missing or unparsable string fields become
/// empty and numeric fields become zero, so a damaged log still yields a
/// record.
///
/// ```
/// # use perfmap::{CodeEvent, CodeKind};
/// let event: CodeEvent = "Function\t0x10\t\t4\t\tfoo\ta.js\t42\t7".parse().unwrap();
/// assert_eq!(event.kind, CodeKind::Function);
/// assert_eq!(event.address, 16);
/// assert_eq!(event.previous_address, 0);
/// assert_eq!(event.function_name, "foo");
/// assert_eq!(event.line, 42);
/// ```
impl FromStr for CodeEvent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split('\t');
        let kind = match fields.next().map(str::trim) {
            None | Some("") => return Err(Error::MissingKind),
            Some(kind) => kind.parse()?,
        };
        let mut next = || fields.next().unwrap_or_default();

        let address = parse_hex(next());
        let previous_address = parse_hex(next());
        let size = parse_hex(next());
        let comment = next().to_owned();
        let function_name = next().to_owned();
        let script_name = next().to_owned();
        let line = next().trim().parse().unwrap_or_default();
        let column = next().trim().parse().unwrap_or_default();

        Ok(Self {
            kind,
            address,
            previous_address,
            size,
            comment,
            function_name,
            script_name,
            line,
            column,
        })
    }
}

fn parse_hex(field: &str) -> u64 {
    let field = field.trim();
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);
    u64::from_str_radix(digits, 16).unwrap_or_default()
}
