use std::ffi::OsString;

use clap::Parser;
use clap::error::{ContextKind, ContextValue, ErrorKind};

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "corpus-lint",
    version,
    about = "Run a linter against a corpus of real-world repositories",
    args_override_self = true
)]
pub struct Args {
    /// Run only projects marked as disabled instead of the enabled ones
    #[arg(long)]
    pub disabled: bool,

    /// Never touch the network: skip projects without a local copy, lint the rest in place
    #[arg(long)]
    pub offline: bool,

    /// Restrict the run to the first 20 candidate projects
    #[arg(long)]
    pub quick: bool,

    /// Suppress subprocess stdout/stderr
    #[arg(long)]
    pub quiet: bool,

    /// On lint failure, run the linter in fix mode, then hard-reset the checkout
    #[arg(long)]
    pub fix: bool,
}

/// Flags for a single run. Built once from [`Args`] and passed by value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunConfig {
    pub disabled_only: bool,
    pub offline: bool,
    pub quick: bool,
    pub quiet: bool,
    pub fix: bool,
}

impl Args {
    /// Parse `std::env::args_os()`, ignoring flags this binary does not know.
    pub fn parse_lenient() -> Self {
        Self::parse_lenient_from(std::env::args_os())
    }

    /// Like [`Args::parse_lenient`] for an explicit argv. Exits on `--help`,
    /// `--version` and errors other than unknown arguments.
    pub fn parse_lenient_from<I, T>(argv: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        match Self::try_parse_lenient_from(argv) {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    /// Parse `argv`, dropping each token clap rejects as unknown and
    /// stripping values attached to boolean flags, then retrying.
    pub fn try_parse_lenient_from<I, T>(argv: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
        loop {
            let err = match Self::try_parse_from(argv.clone()) {
                Ok(args) => return Ok(args),
                Err(err) => err,
            };
            match repair_argv(&err, &argv) {
                Some(repaired) => argv = repaired,
                None => return Err(err),
            }
        }
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            disabled_only: self.disabled,
            offline: self.offline,
            quick: self.quick,
            quiet: self.quiet,
            fix: self.fix,
        }
    }
}

/// Rewrite `argv` so the token behind `err` no longer fails: unknown tokens
/// are removed, `--flag=value` on a boolean flag becomes `--flag` (or is
/// removed for `false`). `None` when the error is not one to tolerate.
fn repair_argv(err: &clap::Error, argv: &[OsString]) -> Option<Vec<OsString>> {
    let Some(ContextValue::String(bad)) = err.get(ContextKind::InvalidArg) else {
        return None;
    };
    let mut argv = argv.to_vec();
    match err.kind() {
        ErrorKind::UnknownArgument => {
            let idx = unknown_token_index(bad, &argv)?;
            argv.remove(idx);
        }
        ErrorKind::TooManyValues => {
            let prefix = format!("{bad}=");
            let idx = argv
                .iter()
                .skip(1)
                .position(|token| token.to_string_lossy().starts_with(&prefix))?
                + 1;
            let value = argv[idx].to_string_lossy()[prefix.len()..].to_string();
            if value.eq_ignore_ascii_case("false") {
                argv.remove(idx);
            } else {
                argv[idx] = OsString::from(bad.as_str());
            }
        }
        _ => return None,
    }
    Some(argv)
}

/// Locate the argv token clap reported as unknown. `--flag=value` is
/// reported as `--flag` and a short bundle `-vq` as `-v`, so both forms are
/// matched too.
fn unknown_token_index(bad: &str, argv: &[OsString]) -> Option<usize> {
    let with_value = format!("{bad}=");
    let short = bad
        .strip_prefix('-')
        .filter(|rest| !rest.starts_with('-'))
        .and_then(|rest| rest.chars().next());
    argv.iter()
        .enumerate()
        .skip(1)
        .find(|(_, token)| {
            let token = token.to_string_lossy();
            token == bad
                || token.starts_with(&with_value)
                || short.is_some_and(|flag| is_short_bundle(&token, flag))
        })
        .map(|(idx, _)| idx)
}

fn is_short_bundle(token: &str, flag: char) -> bool {
    token
        .strip_prefix('-')
        .is_some_and(|rest| !rest.starts_with('-') && rest.contains(flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["corpus-lint"];
        full.extend_from_slice(argv);
        Args::try_parse_lenient_from(full).unwrap()
    }

    #[test]
    fn defaults_are_all_false() {
        let config = parse(&[]).run_config();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn recognizes_every_flag() {
        let config = parse(&["--disabled", "--offline", "--quick", "--quiet", "--fix"]).run_config();
        assert_eq!(
            config,
            RunConfig {
                disabled_only: true,
                offline: true,
                quick: true,
                quiet: true,
                fix: true,
            }
        );
    }

    #[test]
    fn unknown_flags_are_ignored() {
        let config = parse(&["--verbose", "--fix", "--bogus"]).run_config();
        assert!(config.fix);
        assert!(!config.quiet);
    }

    #[test]
    fn unknown_flag_with_value_is_ignored() {
        let config = parse(&["--reporter=dot", "--quick"]).run_config();
        assert!(config.quick);
    }

    #[test]
    fn stray_positionals_are_ignored() {
        let config = parse(&["some-project", "--offline", "another"]).run_config();
        assert!(config.offline);
        assert!(!config.fix);
    }

    #[test]
    fn short_flag_bundles_are_ignored() {
        let config = parse(&["-vv", "--fix"]).run_config();
        assert!(config.fix);
        assert!(!config.quick);
    }

    #[test]
    fn mixed_unknown_and_known_flags() {
        let config = parse(&["-x", "--offline", "--bogus", "-qz", "extra", "--quick"]).run_config();
        assert_eq!(
            config,
            RunConfig {
                offline: true,
                quick: true,
                ..RunConfig::default()
            }
        );
    }

    #[test]
    fn repeated_flags_are_accepted() {
        let config = parse(&["--fix", "--fix", "--quiet", "--quiet"]).run_config();
        assert!(config.fix);
        assert!(config.quiet);
    }

    #[test]
    fn value_on_boolean_flag_is_tolerated() {
        assert!(parse(&["--quiet=true"]).run_config().quiet);
        assert!(parse(&["--quiet=1", "--fix"]).run_config().fix);
        assert!(!parse(&["--quiet=false"]).run_config().quiet);
    }

    #[test]
    fn unknown_token_index_skips_program_name() {
        let argv: Vec<OsString> = ["--bogus", "--bogus"].iter().map(OsString::from).collect();
        let err = Args::try_parse_from(argv.clone()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
        assert_eq!(unknown_token_index("--bogus", &argv), Some(1));
    }

    #[test]
    fn unknown_token_index_matches_short_bundles() {
        let argv: Vec<OsString> = ["corpus-lint", "--fix", "-qv"].iter().map(OsString::from).collect();
        assert_eq!(unknown_token_index("-v", &argv), Some(2));
        assert_eq!(unknown_token_index("-z", &argv), None);
    }
}
