//! Descriptor-set validation.
//!
//! Checks the invariants that span several descriptors of one parser:
//! option aliases must be disjoint, value-map keys must be unique, and at
//! most one positional argument may be variadic. The variadic argument's
//! reserve is computed here as well, in a single right-to-left pass.
//!
//! # Examples
//!
//! ```
//! use cmdtree_core::*;
//!
//! let mut args = vec![
//!     ArgumentDescriptor::from_spec(ArgumentSpec::new("src").nargs(-1))?,
//!     ArgumentDescriptor::from_spec(ArgumentSpec::new("dest"))?,
//! ];
//! resolve_arities(&mut args)?;
//! assert_eq!(args[0].arity, Arity::Variadic { reserved: 1 });
//! # Ok::<(), DescriptorError>(())
//! ```

use std::collections::HashSet;

use crate::descriptor::{ArgumentDescriptor, Arity, OptionDescriptor};
use crate::error::DescriptorError;

/// Validates an option set: unique names and disjoint alias sets.
///
/// # Examples
///
/// ```
/// use cmdtree_core::*;
///
/// let options = vec![
///     OptionDescriptor::from_spec(OptionSpec::new("-v, --verbose").flag())?,
///     OptionDescriptor::from_spec(OptionSpec::new("-v, --version").flag())?,
/// ];
/// assert_eq!(
///     validate_options(&options),
///     Err(DescriptorError::DuplicateAlias("-v".into()))
/// );
/// # Ok::<(), DescriptorError>(())
/// ```
pub fn validate_options(options: &[OptionDescriptor]) -> Result<(), DescriptorError> {
    let mut seen_names = HashSet::new();
    let mut seen_aliases = HashSet::new();

    for option in options {
        if !seen_names.insert(option.name.as_str()) {
            return Err(DescriptorError::DuplicateOption(option.name.clone()));
        }
        for alias in option.aliases() {
            if !seen_aliases.insert(alias) {
                return Err(DescriptorError::DuplicateAlias(alias.to_string()));
            }
        }
    }

    Ok(())
}

/// Rejects duplicate argument names.
pub fn validate_arguments(arguments: &[ArgumentDescriptor]) -> Result<(), DescriptorError> {
    let mut seen = HashSet::new();
    for argument in arguments {
        if !seen.insert(argument.name.as_str()) {
            return Err(DescriptorError::DuplicateArgument(argument.name.clone()));
        }
    }
    Ok(())
}

/// Computes the variadic argument's reserve from the fixed arities after it.
///
/// # Errors
///
/// Returns [`DescriptorError::DuplicateVariadic`] when a second variadic
/// argument is found.
pub fn resolve_arities(arguments: &mut [ArgumentDescriptor]) -> Result<(), DescriptorError> {
    let mut reserved = 0;
    let mut variadic: Option<String> = None;

    for argument in arguments.iter_mut().rev() {
        if argument.arity.is_variadic() {
            if let Some(later) = &variadic {
                return Err(DescriptorError::DuplicateVariadic {
                    first: argument.name.clone(),
                    second: later.clone(),
                });
            }
            argument.arity = Arity::Variadic { reserved };
            variadic = Some(argument.name.clone());
        } else {
            reserved += argument.arity.reserve();
        }
    }

    Ok(())
}
