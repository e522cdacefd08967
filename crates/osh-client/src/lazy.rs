// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::cell::OnceCell;

use crate::error::ClientResult;

/// Fill `cell` on first access; a failed initializer leaves it empty so the
/// next access retries.
pub(crate) fn get_or_try_init<T, F>(cell: &OnceCell<T>, init: F) -> ClientResult<&T>
where
    F: FnOnce() -> ClientResult<T>,
{
    if let Some(value) = cell.get() {
        return Ok(value);
    }
    let value = init()?;
    // A re-entrant init may have filled the cell meanwhile; the first value wins
    Ok(cell.get_or_init(|| value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use std::cell::Cell;

    #[test]
    fn test_initializes_once() {
        let cell = OnceCell::new();
        let calls = Cell::new(0);

        for _ in 0..3 {
            let value = get_or_try_init(&cell, || {
                calls.set(calls.get() + 1);
                Ok(42)
            })
            .unwrap();
            assert_eq!(*value, 42);
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_failure_is_not_cached() {
        let cell: OnceCell<u32> = OnceCell::new();

        let err = get_or_try_init(&cell, || Err(ClientError::Scrape("boom".to_string())));
        assert!(err.is_err());
        assert!(cell.get().is_none());

        assert_eq!(*get_or_try_init(&cell, || Ok(7)).unwrap(), 7);
    }
}
