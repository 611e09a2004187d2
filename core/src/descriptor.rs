//! Option and argument descriptors.
//!
//! User-facing specs ([`OptionSpec`], [`ArgumentSpec`]) are loose: aliases
//! are written as a single string such as `"-s, --shout / --no-shout"` and
//! most fields are optional. Normalization turns them into canonical,
//! immutable descriptors ([`OptionDescriptor`], [`ArgumentDescriptor`]) once,
//! when a command is built.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DescriptorError;
use crate::value::Value;

/// Matches `-x` / `--long-name` aliases that start the spec or follow a
/// separator (whitespace, `,`, `|`, `/`).
static ALIAS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s,|/])(--?[A-Za-z0-9?][A-Za-z0-9_.-]*)").expect("valid alias regex")
});

/// Loose option declaration, as written by a command author or a manifest.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{OptionDescriptor, OptionSpec};
///
/// let shout = OptionDescriptor::from_spec(OptionSpec::new("-s, --shout / --no-shout"))?;
/// assert!(shout.is_flag());
/// assert_eq!(shout.name, "shout");
///
/// let name = OptionDescriptor::from_spec(OptionSpec::new("-n, --name").required())?;
/// assert_eq!(name.nargs(), 1);
/// assert_eq!(name.metavar, "<VALUE>");
/// # Ok::<(), cmdtree_core::DescriptorError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Alias string, e.g. `"-v, --verbose"` or `"--color / --no-color"`.
    pub spec: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub is_flag: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nargs: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metavar: Option<String>,
}

impl OptionSpec {
    pub fn new(spec: &str) -> Self {
        Self {
            spec: spec.to_string(),
            ..Default::default()
        }
    }

    /// Overrides the value-map key.
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Declares a boolean flag.
    pub fn flag(mut self) -> Self {
        self.is_flag = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Accumulates repeated occurrences into a list.
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn nargs(mut self, nargs: i64) -> Self {
        self.nargs = Some(nargs);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    pub fn metavar(mut self, metavar: &str) -> Self {
        self.metavar = Some(metavar.to_string());
        self
    }
}

/// Whether an option is a flag or takes values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionKind {
    /// Boolean option; `on` aliases set `true`, `off` aliases set `false`.
    Flag { on: Vec<String>, off: Vec<String> },
    /// Option consuming exactly `nargs` following tokens.
    Valued { aliases: Vec<String>, nargs: usize },
}

/// Which alias group a token matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasMatch {
    On,
    Off,
    Valued(usize),
}

/// Canonical option descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDescriptor {
    /// Value-map key.
    pub name: String,
    pub kind: OptionKind,
    pub required: bool,
    pub multiple: bool,
    /// Starting value; always a list for `multiple` options and a boolean
    /// for single flags.
    pub default: Option<Value>,
    pub metavar: String,
    pub help: Option<String>,
}

impl OptionDescriptor {
    /// Normalizes a loose spec into a descriptor.
    ///
    /// # Errors
    ///
    /// Fails when the spec has no aliases, a valued option has `nargs <= 0`,
    /// or a `multiple` option carries a non-list default.
    pub fn from_spec(spec: OptionSpec) -> Result<Self, DescriptorError> {
        let is_flag = spec.is_flag || spec.spec.contains('/');

        let kind = if is_flag {
            let (on_part, off_part) = spec
                .spec
                .split_once('/')
                .unwrap_or((spec.spec.as_str(), ""));
            let on = extract_aliases(on_part);
            let off = extract_aliases(off_part);
            if on.is_empty() && off.is_empty() {
                return Err(DescriptorError::NoAliases(spec.spec));
            }
            OptionKind::Flag { on, off }
        } else {
            let aliases = extract_aliases(&spec.spec);
            if aliases.is_empty() {
                return Err(DescriptorError::NoAliases(spec.spec));
            }
            let nargs = spec.nargs.unwrap_or(1);
            if nargs <= 0 {
                let name = spec
                    .name
                    .clone()
                    .unwrap_or_else(|| strip_dashes(longest(&aliases)));
                return Err(DescriptorError::InvalidOptionNargs { name, nargs });
            }
            OptionKind::Valued {
                aliases,
                nargs: nargs as usize,
            }
        };

        let name = match spec.name {
            Some(name) => name,
            None => strip_dashes(longest(naming_aliases(&kind))),
        };

        let default = if spec.multiple {
            match spec.default {
                None => Some(Value::empty_list()),
                Some(list @ Value::List(_)) => Some(list),
                Some(_) => return Err(DescriptorError::NonListDefault(name)),
            }
        } else if is_flag {
            Some(Value::Bool(spec.default.is_some_and(|v| v.truthy())))
        } else {
            spec.default
        };

        let metavar = match &kind {
            OptionKind::Flag { .. } => String::new(),
            OptionKind::Valued { nargs, .. } => spec.metavar.unwrap_or_else(|| {
                if *nargs == 1 {
                    "<VALUE>".to_string()
                } else {
                    "<VALUES...>".to_string()
                }
            }),
        };

        Ok(Self {
            name,
            kind,
            required: spec.required,
            multiple: spec.multiple,
            default,
            metavar,
            help: spec.help,
        })
    }

    pub fn is_flag(&self) -> bool {
        matches!(self.kind, OptionKind::Flag { .. })
    }

    /// Number of tokens consumed after the alias; zero for flags.
    pub fn nargs(&self) -> usize {
        match self.kind {
            OptionKind::Flag { .. } => 0,
            OptionKind::Valued { nargs, .. } => nargs,
        }
    }

    /// All aliases, on-group first.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        let (first, second): (&[String], &[String]) = match &self.kind {
            OptionKind::Flag { on, off } => (on.as_slice(), off.as_slice()),
            OptionKind::Valued { aliases, .. } => (aliases.as_slice(), &[]),
        };
        first.iter().chain(second.iter()).map(String::as_str)
    }

    /// Resolves a raw token against this option's aliases.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdtree_core::{AliasMatch, OptionDescriptor, OptionSpec};
    ///
    /// let color = OptionDescriptor::from_spec(OptionSpec::new("--color / --no-color"))?;
    /// assert_eq!(color.matches("--color"), Some(AliasMatch::On));
    /// assert_eq!(color.matches("--no-color"), Some(AliasMatch::Off));
    /// assert_eq!(color.matches("--colour"), None);
    /// # Ok::<(), cmdtree_core::DescriptorError>(())
    /// ```
    pub fn matches(&self, token: &str) -> Option<AliasMatch> {
        match &self.kind {
            OptionKind::Flag { on, off } => {
                if on.iter().any(|a| a == token) {
                    Some(AliasMatch::On)
                } else if off.iter().any(|a| a == token) {
                    Some(AliasMatch::Off)
                } else {
                    None
                }
            }
            OptionKind::Valued { aliases, nargs } => {
                aliases.iter().any(|a| a == token).then_some(AliasMatch::Valued(*nargs))
            }
        }
    }

    /// Alias shown in messages: the longest on/valued alias.
    pub fn display_alias(&self) -> &str {
        longest(naming_aliases(&self.kind))
    }

    /// Usage fragment, e.g. `-n, --name <VALUE>` or `--color / --no-color`.
    pub fn usage_fragment(&self) -> String {
        match &self.kind {
            OptionKind::Flag { on, off } if off.is_empty() => on.join(", "),
            OptionKind::Flag { on, off } => format!("{} / {}", on.join(", "), off.join(", ")),
            OptionKind::Valued { aliases, .. } => format!("{} {}", aliases.join(", "), self.metavar),
        }
    }

    /// Returns `true` if `value` satisfies a `required` constraint.
    pub fn is_satisfied_by(&self, value: Option<&Value>) -> bool {
        match value {
            None => false,
            Some(Value::List(items)) if self.multiple => !items.is_empty(),
            Some(_) => true,
        }
    }
}

/// Loose positional-argument declaration.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{Arity, ArgumentDescriptor, ArgumentSpec};
///
/// let files = ArgumentDescriptor::from_spec(ArgumentSpec::new("files").nargs(-1))?;
/// assert!(files.arity.is_variadic());
/// assert_eq!(files.metavar, "[FILES...]");
///
/// let src = ArgumentDescriptor::from_spec(ArgumentSpec::new("src"))?;
/// assert_eq!(src.arity, Arity::Fixed(1));
/// assert_eq!(src.metavar, "SRC");
/// # Ok::<(), cmdtree_core::DescriptorError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentSpec {
    pub name: String,
    /// Token count; negative means variadic. Defaults to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nargs: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metavar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl ArgumentSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn nargs(mut self, nargs: i64) -> Self {
        self.nargs = Some(nargs);
        self
    }

    pub fn metavar(mut self, metavar: &str) -> Self {
        self.metavar = Some(metavar.to_string());
        self
    }

    pub fn help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }
}

/// How many tokens an argument consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many tokens.
    Fixed(usize),
    /// Everything that remains, minus `reserved` tokens owed to the fixed
    /// arguments declared after this one.
    Variadic { reserved: usize },
}

impl Arity {
    pub fn is_variadic(&self) -> bool {
        matches!(self, Arity::Variadic { .. })
    }

    /// Tokens wanted when `remaining` tokens are left in the stream.
    pub fn wanted(&self, remaining: usize) -> usize {
        match *self {
            Arity::Fixed(n) => n,
            Arity::Variadic { reserved } => remaining.saturating_sub(reserved),
        }
    }

    /// Tokens counted against a preceding variadic argument's reserve.
    pub fn reserve(&self) -> usize {
        match *self {
            Arity::Fixed(n) => n,
            Arity::Variadic { .. } => 0,
        }
    }
}

/// Canonical positional-argument descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentDescriptor {
    pub name: String,
    pub arity: Arity,
    pub metavar: String,
    pub help: Option<String>,
}

impl ArgumentDescriptor {
    /// Normalizes a loose spec. The variadic reserve is left at zero until
    /// the parser runs its arity pass.
    ///
    /// # Errors
    ///
    /// Fails on an empty name or `nargs == 0`.
    pub fn from_spec(spec: ArgumentSpec) -> Result<Self, DescriptorError> {
        let name = spec.name.trim().to_string();
        if name.is_empty() {
            return Err(DescriptorError::MissingArgumentName);
        }

        let arity = match spec.nargs.unwrap_or(1) {
            0 => return Err(DescriptorError::ZeroArgumentNargs(name)),
            n if n < 0 => Arity::Variadic { reserved: 0 },
            n => Arity::Fixed(n as usize),
        };

        let metavar = spec.metavar.unwrap_or_else(|| {
            let upper = name.to_uppercase();
            if arity == Arity::Fixed(1) {
                upper
            } else {
                format!("[{upper}...]")
            }
        });

        Ok(Self {
            name,
            arity,
            metavar,
            help: spec.help,
        })
    }
}

fn extract_aliases(spec: &str) -> Vec<String> {
    ALIAS_RE
        .captures_iter(spec)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

fn naming_aliases(kind: &OptionKind) -> &[String] {
    match kind {
        OptionKind::Flag { on, off } if on.is_empty() => off,
        OptionKind::Flag { on, .. } => on,
        OptionKind::Valued { aliases, .. } => aliases,
    }
}

/// First alias of maximal length.
fn longest(aliases: &[String]) -> &str {
    aliases
        .iter()
        .fold("", |best, alias| {
            if alias.len() > best.len() {
                alias.as_str()
            } else {
                best
            }
        })
}

fn strip_dashes(alias: &str) -> String {
    alias.trim_start_matches('-').to_string()
}
