/// Kind of value a flag carries on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Toggle, present or absent
    Boolean,
    /// Takes a numeric argument (not validated here, the engine parses it)
    Numeric,
    /// Takes a free-form string argument
    Text,
}

impl ValueKind {
    /// Whether the flag consumes the following token
    pub const fn takes_value(self) -> bool {
        !matches!(self, Self::Boolean)
    }
}

/// One flag understood by the transcription engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagSpec {
    /// Long form, used as the canonical key
    pub name: &'static str,
    /// Optional short alias
    pub alias: Option<&'static str>,
    /// Value kind
    pub kind: ValueKind,
}

impl FlagSpec {
    const fn numeric(name: &'static str, alias: &'static str) -> Self {
        Self { name, alias: Some(alias), kind: ValueKind::Numeric }
    }

    const fn boolean(name: &'static str, alias: &'static str) -> Self {
        Self { name, alias: Some(alias), kind: ValueKind::Boolean }
    }

    const fn text(name: &'static str, alias: &'static str) -> Self {
        Self { name, alias: Some(alias), kind: ValueKind::Text }
    }

    const fn long_only(name: &'static str, kind: ValueKind) -> Self {
        Self { name, alias: None, kind }
    }

    /// Whether `token` is this flag's long form or alias
    pub fn matches(&self, token: &str) -> bool {
        token == self.name || self.alias == Some(token)
    }
}

/// Every flag forwarded to `whisper-cli`, in scan order.
pub const REGISTRY: &[FlagSpec] = &[
    FlagSpec::numeric("--threads", "-t"),
    FlagSpec::numeric("--processors", "-p"),
    FlagSpec::numeric("--offset-t", "-ot"),
    FlagSpec::numeric("--offset-n", "-on"),
    FlagSpec::numeric("--duration", "-d"),
    FlagSpec::numeric("--max-context", "-mc"),
    FlagSpec::numeric("--max-len", "-ml"),
    FlagSpec::numeric("--best-of", "-bo"),
    FlagSpec::numeric("--beam-size", "-bs"),
    FlagSpec::numeric("--audio-ctx", "-ac"),
    FlagSpec::numeric("--word-thold", "-wt"),
    FlagSpec::numeric("--entropy-thold", "-et"),
    FlagSpec::numeric("--logprob-thold", "-lpt"),
    FlagSpec::numeric("--no-speech-thold", "-nth"),
    FlagSpec::numeric("--temperature", "-tp"),
    FlagSpec::numeric("--temperature-inc", "-tpi"),
    FlagSpec::numeric("--vad-threshold", "-vt"),
    FlagSpec::numeric("--vad-min-speech-duration-ms", "-vspd"),
    FlagSpec::numeric("--vad-min-silence-duration-ms", "-vsd"),
    FlagSpec::numeric("--vad-max-speech-duration-s", "-vmsd"),
    FlagSpec::numeric("--vad-speech-pad-ms", "-vp"),
    FlagSpec::numeric("--vad-samples-overlap", "-vo"),
    FlagSpec::boolean("--split-on-word", "-sow"),
    FlagSpec::boolean("--debug-mode", "-debug"),
    FlagSpec::boolean("--translate", "-tr"),
    FlagSpec::boolean("--diarize", "-di"),
    FlagSpec::boolean("--tinydiarize", "-tdrz"),
    FlagSpec::boolean("--no-fallback", "-nf"),
    FlagSpec::boolean("--output-txt", "-otxt"),
    FlagSpec::boolean("--output-vtt", "-ovtt"),
    FlagSpec::boolean("--output-srt", "-osrt"),
    FlagSpec::boolean("--output-lrc", "-olrc"),
    FlagSpec::boolean("--output-words", "-owts"),
    FlagSpec::boolean("--output-csv", "-ocsv"),
    FlagSpec::boolean("--output-json", "-oj"),
    FlagSpec::boolean("--output-json-full", "-ojf"),
    FlagSpec::boolean("--no-prints", "-np"),
    FlagSpec::boolean("--print-special", "-ps"),
    FlagSpec::boolean("--print-colors", "-pc"),
    FlagSpec::boolean("--print-progress", "-pp"),
    FlagSpec::boolean("--no-timestamps", "-nt"),
    FlagSpec::boolean("--detect-language", "-dl"),
    FlagSpec::boolean("--log-score", "-ls"),
    FlagSpec::boolean("--no-gpu", "-ng"),
    FlagSpec::boolean("--flash-attn", "-fa"),
    FlagSpec::boolean("--no-flash-attn", "-nfa"),
    FlagSpec::boolean("--suppress-nst", "-sns"),
    FlagSpec::text("--output-file", "-of"),
    FlagSpec::text("--language", "-l"),
    FlagSpec::text("--font-path", "-fp"),
    FlagSpec::text("--model", "-m"),
    FlagSpec::text("--file", "-f"),
    FlagSpec::text("--vad-model", "-vm"),
    FlagSpec::text("--ov-e-device", "-oved"),
    FlagSpec::text("--dtw", "-dtw"),
    FlagSpec::long_only("--print-confidence", ValueKind::Text),
    FlagSpec::long_only("--carry-initial-prompt", ValueKind::Text),
    FlagSpec::long_only("--vad", ValueKind::Text),
    FlagSpec::long_only("--prompt", ValueKind::Text),
    FlagSpec::long_only("--suppress-regex", ValueKind::Text),
    FlagSpec::long_only("--grammar", ValueKind::Text),
    FlagSpec::long_only("--grammar-rule", ValueKind::Text),
    FlagSpec::long_only("--grammar-penalty", ValueKind::Numeric),
];

/// Find a flag by long form or alias
pub fn lookup(token: &str) -> Option<&'static FlagSpec> {
    REGISTRY.iter().find(|spec| spec.matches(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lookup_by_name_and_alias() {
        let by_name = lookup("--language").unwrap();
        let by_alias = lookup("-l").unwrap();
        assert_eq!(by_name, by_alias);
        assert_eq!(by_name.kind, ValueKind::Text);
    }

    #[test]
    fn test_lookup_long_only_flag() {
        let spec = lookup("--grammar-penalty").unwrap();
        assert_eq!(spec.alias, None);
        assert_eq!(spec.kind, ValueKind::Numeric);
    }

    #[test]
    fn test_lookup_unknown() {
        assert!(lookup("--not-a-flag").is_none());
        assert!(lookup("clip.wav").is_none());
    }

    #[test]
    fn test_names_and_aliases_unique() {
        let mut seen = HashSet::new();
        for spec in REGISTRY {
            assert!(seen.insert(spec.name), "duplicate token {}", spec.name);
            if let Some(alias) = spec.alias {
                assert!(seen.insert(alias), "duplicate token {alias}");
            }
        }
    }

    #[test]
    fn test_every_name_is_long_form() {
        assert!(REGISTRY.iter().all(|spec| spec.name.starts_with("--")));
    }

    #[test]
    fn test_takes_value() {
        assert!(!ValueKind::Boolean.takes_value());
        assert!(ValueKind::Numeric.takes_value());
        assert!(ValueKind::Text.takes_value());
    }
}
