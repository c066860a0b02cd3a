use clap::{CommandFactory, Parser};
use std::fmt::Write as _;

/// Command-line flags. On the command line they are written `/X` or `/Xarg`
/// (case-sensitive letter); `normalize` maps them onto clap's short flags.
#[derive(Parser, Debug, Default, Clone, PartialEq, Eq)]
#[command(name = "kiseger", disable_help_flag = true, disable_version_flag = true, args_override_self = true)]
pub struct Args {
    /// Shows this message
    #[arg(short = '?')]
    pub help: bool,
    /// Breaks for debugger
    #[arg(short = 'D')]
    pub debug_break: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("could not parse arguments: {0}")]
    Parse(#[from] clap::Error),
}

/// An argument that was skipped rather than treated as fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejected {
    Malformed { index: usize, arg: String },
    Unknown { index: usize, flag: char },
}

impl std::fmt::Display for Rejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejected::Malformed { index, arg } => write!(f, "invalid argument {index}: {arg}"),
            Rejected::Unknown { index, flag } => write!(f, "unknown flag {index}: /{flag}"),
        }
    }
}

#[derive(Debug, Default)]
pub struct Invocation {
    pub args: Args,
    pub rejected: Vec<Rejected>,
}

/// Rewrites `/X[arg]` into clap short flags, skipping anything malformed or
/// unknown. The first item is the program name and passes through untouched.
pub fn normalize<I, S>(argv: I) -> (Vec<String>, Vec<Rejected>)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let cmd = Args::command();
    let mut out = Vec::new();
    let mut rejected = Vec::new();

    for (index, arg) in argv.into_iter().map(Into::into).enumerate() {
        if index == 0 {
            out.push(arg);
            continue;
        }
        let mut chars = arg.chars();
        let flag = match (chars.next(), chars.next()) {
            (Some('/'), Some(flag)) => flag,
            _ => {
                rejected.push(Rejected::Malformed { index, arg });
                continue;
            }
        };
        let rest = chars.as_str();
        let Some(known) = cmd.get_arguments().find(|a| a.get_short() == Some(flag)) else {
            rejected.push(Rejected::Unknown { index, flag });
            continue;
        };
        if known.get_action().takes_values() {
            out.push(format!("-{flag}{rest}"));
        } else {
            // Trailing text on a plain switch is ignored.
            out.push(format!("-{flag}"));
        }
    }
    (out, rejected)
}

pub fn parse<I, S>(argv: I) -> Result<Invocation, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let (normalized, rejected) = normalize(argv);
    let args = Args::try_parse_from(normalized)?;
    Ok(Invocation { args, rejected })
}

/// Usage text in the slash syntax, one flag per line.
pub fn usage() -> String {
    let cmd = Args::command();
    let mut text = String::new();
    for arg in cmd.get_arguments() {
        let Some(flag) = arg.get_short() else { continue };
        let suffix = if arg.get_action().takes_values() { "arg" } else { "" };
        let help = arg.get_help().map(ToString::to_string).unwrap_or_default();
        let _ = writeln!(text, "/{flag}{suffix}\t{help}");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments() {
        let inv = parse(["kiseger"]).unwrap();
        assert_eq!(inv.args, Args::default());
        assert!(inv.rejected.is_empty());
    }

    #[test]
    fn test_slash_flags() {
        let inv = parse(["kiseger", "/D"]).unwrap();
        assert!(inv.args.debug_break);
        assert!(!inv.args.help);

        let inv = parse(["kiseger", "/?"]).unwrap();
        assert!(inv.args.help);
    }

    #[test]
    fn test_flag_letter_is_case_sensitive() {
        let inv = parse(["kiseger", "/d"]).unwrap();
        assert!(!inv.args.debug_break);
        assert_eq!(inv.rejected, vec![Rejected::Unknown { index: 1, flag: 'd' }]);
    }

    #[test]
    fn test_bad_arguments_are_skipped() {
        let inv = parse(["kiseger", "-D", "/", "/X", "/D", "plain"]).unwrap();
        assert!(inv.args.debug_break);
        assert_eq!(inv.rejected, vec![
            Rejected::Malformed { index: 1, arg: "-D".into() },
            Rejected::Malformed { index: 2, arg: "/".into() },
            Rejected::Unknown { index: 3, flag: 'X' },
            Rejected::Malformed { index: 5, arg: "plain".into() },
        ]);
    }

    #[test]
    fn test_repeated_and_suffixed_switch() {
        let inv = parse(["kiseger", "/Dnow", "/D"]).unwrap();
        assert!(inv.args.debug_break);
        assert!(inv.rejected.is_empty());
    }

    #[test]
    fn test_usage_lists_flags() {
        let text = usage();
        assert!(text.contains("/?\tShows this message"));
        assert!(text.contains("/D\tBreaks for debugger"));
    }
}
