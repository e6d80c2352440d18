/// Invocation parsing and validation
pub mod parser;
/// Supported engine flags
pub mod registry;
/// Help text
pub mod usage;

pub use parser::{default_flags, parse, FlagSet, FlagValue, ParsedInvocation, UsageError};
pub use registry::{lookup, FlagSpec, ValueKind, REGISTRY};
pub use usage::{usage, wants_help};
