//! Optimistic mutation with rollback.
//!
//! Edits apply locally first so the interface never waits on the
//! network. When the following push is refused, the prior state is
//! restored wholesale and the error handed back to the caller. One
//! helper replaces ad hoc rollback code at every call site.

/// Apply `edit` to `state`, then attempt `push` on the edited state.
/// A push failure restores the previous state and returns the error.
pub fn mutate<S, E>(
    state: &mut S,
    edit: impl FnOnce(&mut S),
    push: impl FnOnce(&S) -> Result<(), E>,
) -> Result<(), E>
where
    S: Clone,
{
    let prior = state.clone();
    edit(state);
    if let Err(err) = push(state) {
        *state = prior;
        return Err(err);
    }
    return Ok(());
}
