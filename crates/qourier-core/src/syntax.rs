//! Syntax templates and the argument matcher.
//!
//! A template is literal text interleaved with three recognized
//! specifiers: `%s` reads a string, `%d` reads an integer, `%x` reads and
//! discards. The literal text between specifiers (the divider) must appear
//! verbatim in the option text; whatever precedes it is the argument for
//! the specifier just consumed.
//!
//! `"%s %d:%d"` matches `"Sunday 21:00"` as well as `"Monday 9:30"`.
//!
//! Known limitations, kept on purpose: there is no escape for a literal
//! `%` (a `%` not followed by `s`/`d`/`x` is ordinary text), and divider
//! search takes the leftmost occurrence, so a divider that recurs earlier
//! than intended wins — pick distinctive literals.

use crate::error::CommandError;

/// Terminator appended to the final divider and to the option text, so the
/// last divider always finds a match at end of input.
const SENTINEL: char = '\n';

/// One two-character marker in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specifier {
    /// `%s`
    Str,
    /// `%d`
    Int,
    /// `%x`
    Ignored,
}

impl Specifier {
    /// The argument kind this specifier produces, if any.
    pub fn kind(self) -> Option<ArgKind> {
        match self {
            Specifier::Str => Some(ArgKind::Str),
            Specifier::Int => Some(ArgKind::Int),
            Specifier::Ignored => None,
        }
    }
}

/// Kind of a produced argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Str,
    Int,
}

impl ArgKind {
    pub fn type_name(self) -> &'static str {
        match self {
            ArgKind::Str => "string",
            ArgKind::Int => "int",
        }
    }
}

/// A matched argument value, in template order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Str(String),
    Int(i64),
}

impl ArgValue {
    pub fn kind(&self) -> ArgKind {
        match self {
            ArgValue::Str(_) => ArgKind::Str,
            ArgValue::Int(_) => ArgKind::Int,
        }
    }
}

/// A parsed syntax template: dividers interleaved with specifiers.
///
/// There is always one more divider than specifiers, and the final divider
/// carries the sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTemplate {
    dividers: Vec<String>,
    specifiers: Vec<Specifier>,
    source: String,
}

impl SyntaxTemplate {
    /// Parse a template string. Parsing never fails; unknown `%` sequences
    /// are literal text.
    pub fn parse(template: &str) -> Self {
        let mut dividers = Vec::new();
        let mut specifiers = Vec::new();

        let mut rest = template;
        loop {
            match next_specifier(rest) {
                Some((pos, specifier)) => {
                    dividers.push(rest[..pos].to_string());
                    specifiers.push(specifier);
                    rest = &rest[pos + 2..];
                }
                None => {
                    let mut last = rest.to_string();
                    last.push(SENTINEL);
                    dividers.push(last);
                    break;
                }
            }
        }

        Self {
            dividers,
            specifiers,
            source: template.to_string(),
        }
    }

    /// The template string this was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Kinds of the arguments a successful match produces, in order.
    pub fn arg_kinds(&self) -> Vec<ArgKind> {
        self.specifiers
            .iter()
            .filter_map(|specifier| specifier.kind())
            .collect()
    }

    /// Match raw option text, producing one value per non-ignored
    /// specifier in template order.
    ///
    /// Each step searches the remaining option text for the next divider
    /// (leftmost occurrence); the text before the match is classified by
    /// the specifier consumed on the previous step. The loop starts as if
    /// an ignored specifier had just been consumed, which discards
    /// whatever precedes the leading divider.
    pub fn match_args(&self, option: &str) -> Result<Vec<ArgValue>, CommandError> {
        let option = format!("{option}{SENTINEL}");
        let mut rest = option.as_str();
        let mut args = Vec::new();

        let mut pending = Specifier::Ignored;
        for (i, divider) in self.dividers.iter().enumerate() {
            let pos = rest
                .find(divider.as_str())
                .ok_or(CommandError::ArgumentCount)?;
            let raw = &rest[..pos];

            match pending {
                Specifier::Str => args.push(ArgValue::Str(raw.to_string())),
                Specifier::Int => {
                    let parsed = raw.parse::<i64>().map_err(|source| {
                        CommandError::ArgumentType {
                            text: raw.to_string(),
                            source,
                        }
                    })?;
                    args.push(ArgValue::Int(parsed));
                }
                Specifier::Ignored => {}
            }

            rest = &rest[pos + divider.len()..];
            if let Some(&next) = self.specifiers.get(i) {
                pending = next;
            }
        }

        Ok(args)
    }
}

/// Leftmost `%s`/`%d`/`%x` in `template`, or `None` when only literal text
/// remains.
fn next_specifier(template: &str) -> Option<(usize, Specifier)> {
    [
        ("%s", Specifier::Str),
        ("%d", Specifier::Int),
        ("%x", Specifier::Ignored),
    ]
    .into_iter()
    .filter_map(|(marker, specifier)| template.find(marker).map(|pos| (pos, specifier)))
    .min_by_key(|&(pos, _)| pos)
}
