use std::fmt::Write;

use super::parser::{FlagSet, FlagValue};
use super::registry::{ValueKind, REGISTRY};

/// Whether the invocation asks for help
pub fn wants_help<S: AsRef<str>>(args: &[S]) -> bool {
    args.iter()
        .any(|arg| matches!(arg.as_ref(), "--help" | "-h"))
}

/// Usage text listing every supported flag and the applied defaults
pub fn usage(program: &str, defaults: &FlagSet) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Usage: {program} [flags...] <file-or-directory>");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Transcribes a single audio file, or every .mp3/.ogg/.wav/.flac file under a directory."
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Flags:");

    for spec in REGISTRY {
        let value = match spec.kind {
            ValueKind::Boolean => "",
            ValueKind::Numeric => " <n>",
            ValueKind::Text => " <s>",
        };
        let names = spec.alias.map_or_else(
            || format!("       {}{value}", spec.name),
            |alias| format!("{alias:>5}, {}{value}", spec.name),
        );
        let _ = writeln!(out, "  {names}");
    }

    if !defaults.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Defaults:");
        for (name, value) in defaults.iter() {
            match value {
                FlagValue::Enabled => {
                    let _ = writeln!(out, "  {name}");
                }
                FlagValue::Value(value) => {
                    let _ = writeln!(out, "  {name} {value}");
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wants_help() {
        assert!(wants_help(&["--help"]));
        assert!(wants_help(&["-l", "en", "-h", "clip.wav"]));
        assert!(!wants_help(&["helpful.wav"]));
        assert!(!wants_help::<&str>(&[]));
    }

    #[test]
    fn test_usage_lists_every_flag() {
        let text = usage("whisper-batch", &FlagSet::new());
        for spec in REGISTRY {
            assert!(text.contains(spec.name), "missing {}", spec.name);
        }
        assert!(text.contains("-l, --language <s>"));
        assert!(text.contains("      --grammar-penalty <n>"));
        assert!(!text.contains("Defaults:"));
    }

    #[test]
    fn test_usage_shows_defaults() {
        let defaults = FlagSet::new()
            .with("--language", FlagValue::Value("en".to_owned()))
            .with("--no-fallback", FlagValue::Enabled);
        let text = usage("whisper-batch", &defaults);
        assert!(text.contains("Defaults:\n  --language en\n  --no-fallback\n"));
    }
}
