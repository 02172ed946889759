use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;

use ctxflow_context::ToolCallContext;

use crate::arguments::error::Error;
use crate::arguments::path::{Path, PathSegment};
use crate::arguments::source::CallState;

/// Path-addressed reader over the arguments of one tool invocation.
///
/// The reader never blocks a thread; accessors suspend until the
/// external source delivers enough data, and resume in the order the
/// data arrives. Cloning the reader is cheap and every clone observes
/// the same argument stream.
#[derive(Clone, Debug)]
pub struct ArgumentsReader {
    rx: watch::Receiver<CallState>,
    context: ToolCallContext,
}

impl ArgumentsReader {
    #[inline]
    pub(crate) fn new(rx: watch::Receiver<CallState>, context: ToolCallContext) -> Self {
        Self { rx, context }
    }

    /// The identifier of the tool call this reader is scoped to.
    #[inline]
    pub fn tool_call_id(&self) -> &str {
        self.context.tool_call_id()
    }

    /// Resolves the final value at `path`.
    ///
    /// Suspends until the value at the path can no longer change, then
    /// returns it. Fails with an [`Aborted`] error when the abort
    /// signal fires (or the source goes away) first, and with
    /// [`Unresolved`] when the final arguments hold nothing at the
    /// path.
    ///
    /// [`Aborted`]: crate::arguments::ErrorKind::Aborted
    /// [`Unresolved`]: crate::arguments::ErrorKind::Unresolved
    pub async fn get(&self, path: Path) -> Result<Value, Error> {
        let mut rx = self.rx.clone();
        loop {
            {
                let state = rx.borrow_and_update();
                if state.is_final(&path) {
                    return match value_at(state.root.as_ref(), &path)? {
                        Some(value) => Ok(value.clone()),
                        None => Err(Error::unresolved()
                            .with_reason(format!("nothing at `{path}`"))),
                    };
                }
            }
            wait_more(&mut rx, &self.context).await?;
        }
    }

    /// Resolves the final value at `path` and decodes it.
    ///
    /// This is the typed edge of the accessor: the path itself is
    /// checked at runtime, and the decoded type carries the static
    /// guarantees from there on. A value that doesn't fit `T` is an
    /// [`InvalidPath`] error.
    ///
    /// [`InvalidPath`]: crate::arguments::ErrorKind::InvalidPath
    pub async fn get_as<T: DeserializeOwned>(&self, path: Path) -> Result<T, Error> {
        let value = self.get(path).await?;
        serde_json::from_value(value)
            .map_err(|err| Error::invalid_path().with_reason(format!("{err}")))
    }

    /// Streams successively more complete values at `path`.
    ///
    /// The sequence is finite: it ends when the value at the path is
    /// final or the call is aborted. Consumers may stop consuming at
    /// any point.
    #[inline]
    pub fn stream(&self, path: Path) -> ValueStream {
        ValueStream {
            rx: self.rx.clone(),
            context: self.context.clone(),
            path,
            last: None,
            terminated: false,
        }
    }

    /// Streams the elements of the array at `path`, one value per
    /// element.
    ///
    /// Unlike [`stream`], this never yields partial snapshots of the
    /// array itself: each element is delivered exactly once, when it
    /// can no longer change. A non-array value at the path is an
    /// [`InvalidPath`] error.
    ///
    /// [`stream`]: ArgumentsReader::stream
    /// [`InvalidPath`]: crate::arguments::ErrorKind::InvalidPath
    #[inline]
    pub fn for_each(&self, path: Path) -> ElementStream {
        ElementStream {
            rx: self.rx.clone(),
            context: self.context.clone(),
            path,
            next_index: 0,
            terminated: false,
        }
    }
}

/// A live sequence of successively more complete values at one path.
///
/// Returned by [`ArgumentsReader::stream`].
#[derive(Debug)]
pub struct ValueStream {
    rx: watch::Receiver<CallState>,
    context: ToolCallContext,
    path: Path,
    last: Option<Value>,
    terminated: bool,
}

impl ValueStream {
    /// Pulls the next, more complete value.
    ///
    /// Returns `Ok(None)` when the value is final or the call was
    /// aborted after at least one value was delivered. Aborting before
    /// any value was delivered is an error, since the path can never
    /// resolve anymore.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe; no value is lost when the returned
    /// future is dropped before completion.
    pub async fn next(&mut self) -> Result<Option<Value>, Error> {
        enum Step {
            Yield(Value, bool),
            End,
            Fail(Error),
            Wait,
        }

        loop {
            if self.terminated {
                return Ok(None);
            }

            let step = {
                let state = self.rx.borrow_and_update();
                let is_final = state.is_final(&self.path);
                match value_at(state.root.as_ref(), &self.path) {
                    Err(err) => Step::Fail(err),
                    Ok(Some(value)) if self.last.as_ref() != Some(value) => {
                        Step::Yield(value.clone(), is_final)
                    }
                    Ok(_) if is_final => Step::End,
                    Ok(_) => Step::Wait,
                }
            };

            match step {
                Step::Yield(value, is_final) => {
                    if is_final {
                        self.terminated = true;
                    }
                    self.last = Some(value.clone());
                    return Ok(Some(value));
                }
                Step::End => {
                    self.terminated = true;
                    return Ok(None);
                }
                Step::Fail(err) => {
                    self.terminated = true;
                    return Err(err);
                }
                Step::Wait => {}
            }

            if let Err(err) = wait_more(&mut self.rx, &self.context).await {
                self.terminated = true;
                // Ending after values were seen is a normal stop, not
                // an error.
                return if self.last.is_some() { Ok(None) } else { Err(err) };
            }
        }
    }
}

/// A live sequence of array elements at one path.
///
/// Returned by [`ArgumentsReader::for_each`].
#[derive(Debug)]
pub struct ElementStream {
    rx: watch::Receiver<CallState>,
    context: ToolCallContext,
    path: Path,
    next_index: usize,
    terminated: bool,
}

impl ElementStream {
    /// Pulls the next complete array element.
    ///
    /// An element is complete when a later element has started to
    /// arrive, when the element's own path was finalized, or when the
    /// whole array is final. Returns `Ok(None)` once every element was
    /// delivered, or when the call was aborted after at least one
    /// element.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe; no element is lost when the
    /// returned future is dropped before completion.
    pub async fn next(&mut self) -> Result<Option<Value>, Error> {
        enum Step {
            Yield(Value),
            End,
            Fail(Error),
            Wait,
        }

        loop {
            if self.terminated {
                return Ok(None);
            }

            let step = {
                let state = self.rx.borrow_and_update();
                let array_final = state.is_final(&self.path);
                match value_at(state.root.as_ref(), &self.path) {
                    Err(err) => Step::Fail(err),
                    Ok(Some(Value::Array(items))) => {
                        if self.next_index < items.len() {
                            let has_later = self.next_index + 1 < items.len();
                            let element_final = array_final
                                || has_later
                                || state.is_final(
                                    &self.path.child(PathSegment::Index(self.next_index)),
                                );
                            if element_final {
                                Step::Yield(items[self.next_index].clone())
                            } else {
                                Step::Wait
                            }
                        } else if array_final {
                            Step::End
                        } else {
                            Step::Wait
                        }
                    }
                    Ok(Some(other)) => Step::Fail(
                        Error::invalid_path().with_reason(format!(
                            "value at `{}` is not an array: {other}",
                            self.path
                        )),
                    ),
                    Ok(None) if array_final => Step::End,
                    Ok(None) => Step::Wait,
                }
            };

            match step {
                Step::Yield(value) => {
                    self.next_index += 1;
                    return Ok(Some(value));
                }
                Step::End => {
                    self.terminated = true;
                    return Ok(None);
                }
                Step::Fail(err) => {
                    self.terminated = true;
                    return Err(err);
                }
                Step::Wait => {}
            }

            if let Err(err) = wait_more(&mut self.rx, &self.context).await {
                self.terminated = true;
                return if self.next_index > 0 { Ok(None) } else { Err(err) };
            }
        }
    }
}

/// Waits for the next state change, translating abort conditions into
/// errors.
///
/// A writer dropped without `finish` counts as an abort: the arguments
/// can never become complete anymore.
async fn wait_more(
    rx: &mut watch::Receiver<CallState>,
    context: &ToolCallContext,
) -> Result<(), Error> {
    tokio::select! {
        _ = context.abort_signal().aborted() => {
            trace!("argument access aborted");
            Err(Error::aborted())
        }
        changed = rx.changed() => changed.map_err(|_| {
            Error::aborted().with_reason("argument source went away")
        }),
    }
}

/// Resolves `path` against the current root value.
///
/// `Ok(None)` means the value is not there (yet); an error means the
/// path can never fit the shape of the data, like a field selector on
/// an array. A `null` on the way counts as not-yet-arrived, since a
/// later snapshot may still grow it into any shape.
fn value_at<'a>(root: Option<&'a Value>, path: &Path) -> Result<Option<&'a Value>, Error> {
    let Some(mut current) = root else {
        return Ok(None);
    };
    for segment in path.segments() {
        let next = match (segment, current) {
            (PathSegment::Field(name), Value::Object(map)) => map.get(name),
            (PathSegment::Index(index), Value::Array(items)) => items.get(*index),
            (_, Value::Null) => None,
            (segment, other) => {
                return Err(Error::invalid_path().with_reason(format!(
                    "`{segment}` does not apply to {other}"
                )));
            }
        };
        match next {
            Some(value) => current = value,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_value_at() {
        let root = json!({
            "query": "rust",
            "filters": { "lang": "en" },
            "items": [1, 2, 3],
        });

        let at = |path: Path| value_at(Some(&root), &path);
        assert_eq!(at(Path::root()).unwrap(), Some(&root));
        assert_eq!(at(crate::path!["query"]).unwrap(), Some(&json!("rust")));
        assert_eq!(
            at(crate::path!["filters", "lang"]).unwrap(),
            Some(&json!("en"))
        );
        assert_eq!(at(crate::path!["items", 1]).unwrap(), Some(&json!(2)));
        assert_eq!(at(crate::path!["items", 9]).unwrap(), None);
        assert_eq!(at(crate::path!["missing"]).unwrap(), None);
        assert!(at(crate::path!["query", "x"]).is_err());
        assert!(at(crate::path!["items", "x"]).is_err());
    }

    #[test]
    fn test_value_at_through_null() {
        let root = json!({ "a": null });
        assert_eq!(
            value_at(Some(&root), &crate::path!["a", "b"]).unwrap(),
            None
        );
        assert_eq!(
            value_at(Some(&root), &crate::path!["a"]).unwrap(),
            Some(&Value::Null)
        );
    }
}
