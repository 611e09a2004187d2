//! Command return codes.

use std::fmt;

/// Outcome of executing a command.
///
/// Failure codes are opaque: whatever a leaf action returns travels back up
/// through every group unchanged.
///
/// # Examples
///
/// ```
/// use cmdtree_dispatch::ReturnCode;
///
/// assert!(ReturnCode::from(()).is_success());
/// assert!(ReturnCode::from(0).is_success());
/// assert_eq!(ReturnCode::from(3), ReturnCode::Failure(3));
/// assert_eq!(ReturnCode::FAILURE.exit_status(), -1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReturnCode {
    #[default]
    Success,
    Failure(i32),
}

impl ReturnCode {
    /// Code used for parse and dispatch errors.
    pub const FAILURE: ReturnCode = ReturnCode::Failure(-1);

    /// `Failure(0)` counts as success; `0` always means success.
    pub fn is_success(self) -> bool {
        matches!(self, ReturnCode::Success | ReturnCode::Failure(0))
    }

    /// Numeric form: `0` for success, the failure value otherwise.
    pub fn exit_status(self) -> i32 {
        match self {
            ReturnCode::Success => 0,
            ReturnCode::Failure(code) => code,
        }
    }
}

impl From<()> for ReturnCode {
    fn from(_: ()) -> Self {
        ReturnCode::Success
    }
}

/// `true` is success, `false` the generic [`ReturnCode::FAILURE`].
impl From<bool> for ReturnCode {
    fn from(ok: bool) -> Self {
        if ok { ReturnCode::Success } else { ReturnCode::FAILURE }
    }
}

impl From<i32> for ReturnCode {
    fn from(code: i32) -> Self {
        if code == 0 {
            ReturnCode::Success
        } else {
            ReturnCode::Failure(code)
        }
    }
}

impl From<Option<i32>> for ReturnCode {
    fn from(code: Option<i32>) -> Self {
        code.map_or(ReturnCode::Success, ReturnCode::from)
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.exit_status())
    }
}
