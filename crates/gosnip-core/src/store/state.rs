//! Command states and their transitions.
//!
//! ```text
//!            create                delete / export
//!   Absent ─────────► Active ─────────────────────► SoftDeleted
//!                     │  ▲ ◄───────────────────────┘
//!   create, recompile └──┘          restore
//! ```
//!
//! Transitions are pure; [`CommandStore`](super::CommandStore) carries them
//! out on disk.

use std::fmt;

use crate::error::{Error, Result};

/// Where a command is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandState {
    /// Neither source nor binary exists.
    Absent,

    /// `src/<name>.go` exists; `bin/<name>` exists once a build succeeds.
    Active,

    /// `src/<name>` exists without its extension; no binary.
    SoftDeleted,
}

/// Operations that move a command between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Delete,
    Restore,
    Export,
    Recompile,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Delete => "delete",
            Operation::Restore => "restore",
            Operation::Export => "export",
            Operation::Recompile => "recompile",
        };
        f.write_str(name)
    }
}

impl CommandState {
    /// State after applying `op` to a command named `name` in this state.
    ///
    /// # Errors
    /// [`Error::NotFound`] when the operation needs a source that is not
    /// there, [`Error::InvalidOperation`] when it would leave two source
    /// entries for one name.
    pub fn apply(self, op: Operation, name: &str) -> Result<CommandState> {
        use CommandState::*;

        match (self, op) {
            (Absent | Active, Operation::Create) => Ok(Active),
            (SoftDeleted, Operation::Create) => Err(Error::InvalidOperation(format!(
                "'{}' is soft-deleted; restore it before creating a command with the same name",
                name
            ))),

            (Active, Operation::Delete | Operation::Export) => Ok(SoftDeleted),
            (Active, Operation::Recompile) => Ok(Active),
            (SoftDeleted, Operation::Restore) => Ok(Active),

            (Active, Operation::Restore) => Err(Error::InvalidOperation(format!(
                "'{}' is already active",
                name
            ))),
            (Absent | SoftDeleted, Operation::Delete | Operation::Export | Operation::Recompile) => {
                Err(Error::source_not_found(name))
            }
            (Absent, Operation::Restore) => Err(Error::NotFound {
                kind: "deleted source",
                name: name.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CommandState::*;

    #[test]
    fn test_happy_path() {
        let state = Absent.apply(Operation::Create, "foo").unwrap();
        assert_eq!(state, Active);

        let state = state.apply(Operation::Delete, "foo").unwrap();
        assert_eq!(state, SoftDeleted);

        let state = state.apply(Operation::Restore, "foo").unwrap();
        assert_eq!(state, Active);

        assert_eq!(state.apply(Operation::Recompile, "foo").unwrap(), Active);
        assert_eq!(state.apply(Operation::Export, "foo").unwrap(), SoftDeleted);
        assert_eq!(state.apply(Operation::Create, "foo").unwrap(), Active);
    }

    #[test]
    fn test_not_found() {
        for op in [Operation::Delete, Operation::Export, Operation::Recompile, Operation::Restore] {
            let err = Absent.apply(op, "foo").unwrap_err();
            assert!(matches!(err, Error::NotFound { .. }), "{} on absent", op);
        }
        assert!(matches!(
            SoftDeleted.apply(Operation::Delete, "foo"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_operations() {
        assert!(matches!(
            SoftDeleted.apply(Operation::Create, "foo"),
            Err(Error::InvalidOperation(_))
        ));
        assert!(matches!(
            Active.apply(Operation::Restore, "foo"),
            Err(Error::InvalidOperation(_))
        ));
    }
}
