//! Resumable chain of unary transforms.

use std::fmt;
use std::sync::Arc;

/// A single transform stage.
pub type Stage<T> = Arc<dyn Fn(T) -> T + Send + Sync>;

/// An ordered, resumable sequence of transforms.
///
/// Each stage receives the previous stage's output. The pipe remembers how
/// many stages already ran and the last computed value, so stages joined after
/// a [`Pipe::process`] call run against that value on the next call instead
/// of replaying the whole chain.
///
/// ```
/// use reqflow::core::Pipe;
///
/// let mut pipe = Pipe::new();
/// pipe.join(|x: i32| x + 1).join(|x| x * 10);
/// assert_eq!(*pipe.process(Some(1)), 20);
///
/// pipe.join(|x| x - 5);
/// // The new input is ignored; only the new stage runs.
/// assert_eq!(*pipe.process(Some(100)), 15);
/// ```
pub struct Pipe<T> {
    stages: Vec<Stage<T>>,
    cursor: usize,
    value: Option<T>,
}

impl<T> Pipe<T> {
    /// Creates an empty pipe.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stages: Vec::new(),
            cursor: 0,
            value: None,
        }
    }

    /// Appends a stage.
    pub fn join<F>(&mut self, stage: F) -> &mut Self
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Appends an already shared stage.
    pub fn join_shared(&mut self, stage: Stage<T>) -> &mut Self {
        self.stages.push(stage);
        self
    }

    /// Returns the number of joined stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Marks every stage that has not run yet as run, without running it.
    ///
    /// Returns how many stages were skipped. The last value is kept.
    pub fn skip_pending(&mut self) -> usize {
        let skipped = self.stages.len() - self.cursor;
        self.cursor = self.stages.len();
        skipped
    }

    /// Returns true if no stage has been joined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns how many stages have already run.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the last computed value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Consumes the pipe and returns the last computed value.
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        self.value
    }
}

impl<T: Default> Pipe<T> {
    /// Runs every stage that has not run yet and returns the result.
    ///
    /// `input` seeds the running value only while no stage has run. After
    /// that it is ignored and pending stages continue from the last value.
    pub fn process(&mut self, input: Option<T>) -> &T {
        if self.cursor == 0 {
            if let Some(input) = input {
                self.value = Some(input);
            }
        }

        let mut value = self.value.take().unwrap_or_default();
        for stage in &self.stages[self.cursor..] {
            value = stage(value);
        }
        self.cursor = self.stages.len();

        self.value.insert(value)
    }
}

impl<T> Default for Pipe<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for Pipe<T> {
    fn clone(&self) -> Self {
        Self {
            stages: self.stages.clone(),
            cursor: self.cursor,
            value: self.value.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Pipe<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipe")
            .field("stages", &self.stages.len())
            .field("cursor", &self.cursor)
            .field("value", &self.value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_process_runs_stages_in_order() {
        let mut pipe = Pipe::new();
        pipe.join(|s: String| s + "a")
            .join(|s| s + "b")
            .join(|s| s + "c");

        assert_eq!(pipe.process(Some(String::from(">"))), ">abc");
        assert_eq!(pipe.cursor(), 3);
    }

    #[test]
    fn test_process_without_stages_seeds_value() {
        let mut pipe: Pipe<i32> = Pipe::new();
        assert_eq!(*pipe.process(Some(7)), 7);
        assert_eq!(pipe.cursor(), 0);

        // Nothing has run yet, so a new input still seeds.
        assert_eq!(*pipe.process(Some(9)), 9);
    }

    #[test]
    fn test_skip_pending_keeps_value() {
        let mut pipe = Pipe::new();
        pipe.join(|x: i32| x + 1);
        assert_eq!(*pipe.process(Some(1)), 2);

        pipe.join(|x| x * 100).join(|x| x * 100);
        assert_eq!(pipe.skip_pending(), 2);
        assert_eq!(pipe.cursor(), 3);

        pipe.join(|x| x + 3);
        assert_eq!(*pipe.process(None), 5);
    }

    #[test]
    fn test_process_without_input_uses_default() {
        let mut pipe = Pipe::new();
        pipe.join(|x: i32| x + 1);
        assert_eq!(*pipe.process(None), 1);
    }

    #[test]
    fn test_appended_stage_runs_against_last_value() {
        let mut pipe = Pipe::new();
        pipe.join(|x: i32| x * 2);
        assert_eq!(*pipe.process(Some(5)), 10);

        pipe.join(|x| x + 1);
        assert_eq!(*pipe.process(Some(1000)), 11);
        assert_eq!(*pipe.process(None), 11);
    }

    #[test]
    fn test_completed_stages_never_rerun() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut pipe = Pipe::new();
        pipe.join(move |x: i32| {
            counter.fetch_add(1, Ordering::SeqCst);
            x
        });

        pipe.process(Some(1));
        pipe.process(Some(2));
        pipe.join(|x| x);
        pipe.process(None);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stage_may_change_meaning_of_value() {
        let mut pipe = Pipe::new();
        pipe.join(|v: serde_json::Value| serde_json::json!({ "wrapped": v }))
            .join(|v| v["wrapped"]["n"].clone());

        let out = pipe.process(Some(serde_json::json!({ "n": 3 })));
        assert_eq!(out, &serde_json::json!(3));
    }

    #[test]
    fn test_clone_keeps_progress() {
        let mut pipe = Pipe::new();
        pipe.join(|x: i32| x + 1);
        pipe.process(Some(1));

        let mut copy = pipe.clone();
        copy.join(|x| x * 100);
        assert_eq!(*copy.process(None), 200);
        assert_eq!(pipe.value(), Some(&2));
    }
}
