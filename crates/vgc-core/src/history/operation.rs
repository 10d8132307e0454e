//! Recorded atomic operations.

/// An atomic change recorded in an undo group.
///
/// `undo` and `redo` are called with the same target the change was applied
/// to. Operations of a group are undone in reverse order and redone in
/// recording order.
pub trait UndoOperation<T> {
    /// Returns the name of the operation for display.
    fn name(&self) -> &str;

    /// Reverts the change.
    fn undo(&mut self, target: &mut T) -> anyhow::Result<()>;

    /// Re-applies the change.
    fn redo(&mut self, target: &mut T) -> anyhow::Result<()>;
}

type Step<T> = Box<dyn FnMut(&mut T)>;

/// An operation built from a pair of closures.
pub struct ClosureOperation<T> {
    name: String,
    undo: Step<T>,
    redo: Step<T>,
}

impl<T> ClosureOperation<T> {
    pub fn new<U, R>(name: impl Into<String>, undo: U, redo: R) -> Self
    where
        U: FnMut(&mut T) + 'static,
        R: FnMut(&mut T) + 'static,
    {
        Self {
            name: name.into(),
            undo: Box::new(undo),
            redo: Box::new(redo),
        }
    }
}

impl<T> UndoOperation<T> for ClosureOperation<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn undo(&mut self, target: &mut T) -> anyhow::Result<()> {
        (self.undo)(target);
        Ok(())
    }

    fn redo(&mut self, target: &mut T) -> anyhow::Result<()> {
        (self.redo)(target);
        Ok(())
    }
}

impl<T> std::fmt::Debug for ClosureOperation<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureOperation")
            .field("name", &self.name)
            .finish()
    }
}
