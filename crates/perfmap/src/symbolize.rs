use crate::event::CodeEvent;
use std::{borrow::Cow, fmt};

/// Display label of an event.
///
/// The runtime's comment wins when present. Otherwise the function name,
/// followed by ` <script>:<line>` when the script is known. Both empty
/// yields an empty label; the record is still written.
///
/// ```
/// # use perfmap::{CodeEvent, CodeKind, symbolize::label};
/// let event = CodeEvent::new(CodeKind::Function, 0, 0)
///     .with_function_name("foo")
///     .with_script("a.js", 42, 1);
/// assert_eq!(label(&event), "foo a.js:42");
/// ```
pub fn label(event: &CodeEvent) -> Cow<'_, str> {
    if !event.comment.is_empty() {
        return Cow::Borrowed(&event.comment);
    }
    if event.script_name.is_empty() {
        return Cow::Borrowed(&event.function_name);
    }
    Cow::Owned(format!(
        "{} {}:{}",
        event.function_name, event.script_name, event.line
    ))
}

/// One line of the perf map, without the trailing newline:
/// `<address-hex> <size-hex> <kind>:<label>`.
#[derive(Debug, Clone, Copy)]
pub struct MapRecord<'a> {
    event: &'a CodeEvent,
}

impl<'a> MapRecord<'a> {
    pub fn new(event: &'a CodeEvent) -> Self {
        Self { event }
    }
}

impl fmt::Display for MapRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let event = self.event;
        write!(f, "{:x} {:x} {}:", event.address, event.size, event.kind)?;

        let label = label(event);
        // a newline in the label would split the record in two
        if label.contains(['\n', '\r']) {
            f.write_str(&label.replace(['\n', '\r'], " "))
        } else {
            f.write_str(&label)
        }
    }
}
