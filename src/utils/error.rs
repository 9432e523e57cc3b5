/// Flattens an error chain into one bounded line suitable for the artifact `error` field.
///
/// Provider errors routinely embed whole response bodies and multi-line backtraces;
/// both are dropped so the persisted message stays readable by the presentation layer.
pub fn compact_error_message(message: &str, max_len: usize) -> String {
    let mut head = message;
    if let Some(idx) = head.find("Stack backtrace:") {
        head = &head[..idx];
    }
    let elided;
    if let Some((prefix, _)) = head.split_once(" text: ") {
        elided = format!("{prefix} text=<omitted>");
        head = &elided;
    }

    let mut out = String::with_capacity(head.len().min(max_len.saturating_add(16)));
    for word in head.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
        if out.len() > max_len {
            break;
        }
    }

    if out.len() > max_len {
        let mut cut = max_len;
        while cut > 0 && !out.is_char_boundary(cut) {
            cut -= 1;
        }
        out.truncate(cut);
        out.push_str("...(truncated)");
    }
    out
}
