//! Accumulation of field validation failures.

use std::fmt;

/// Every field failure found while validating one multi-field input.
///
/// Callers validate all fields and only proceed when the container is
/// empty, so a single response reports everything that is wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors<E> {
    errors: Vec<E>,
}

impl<E> Default for ValidationErrors<E> {
    fn default() -> Self {
        Self { errors: Vec::new() }
    }
}

impl<E> ValidationErrors<E> {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure.
    pub fn add(&mut self, error: impl Into<E>) {
        self.errors.push(error.into());
    }

    /// Returns the value of `result`, or records its error and returns `None`.
    pub fn check<T, F: Into<E>>(&mut self, result: Result<T, F>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.add(error);
                None
            }
        }
    }

    /// Returns `true` if no failure was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of recorded failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Recorded failures in the order they were found.
    #[must_use]
    pub fn errors(&self) -> &[E] {
        &self.errors
    }

    /// `Ok(())` when empty, otherwise the container itself.
    ///
    /// # Errors
    ///
    /// Returns `self` if at least one failure was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl<E> IntoIterator for ValidationErrors<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<E: fmt::Display> fmt::Display for ValidationErrors<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.errors.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl<E: std::error::Error> std::error::Error for ValidationErrors<E> {}
