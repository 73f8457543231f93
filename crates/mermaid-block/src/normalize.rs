use std::borrow::Cow;

/// Restores diagram text that went through published HTML into a form Mermaid accepts.
///
/// Storage and transport can entity-encode `>` and turn `--` into typographic dashes, so the
/// arrow syntax (`-->`) arrives mangled. The steps are:
/// - decode HTML entities
/// - turn `–>` / `—>` and a lone `->` into `-->`
/// - replace the whitespace on each side of every `-->` (including `&nbsp;` and line breaks)
///   with exactly one space
/// - trim
///
/// The function is idempotent: running it on its own output is a no-op. Longer arrows (`--->`),
/// dotted arrows (`-.->`), bidirectional arrows (`<-->`) and sequence messages (`->>`) are left
/// alone.
pub fn normalize_code(raw: &str) -> String {
    let decoded = decode_entities(raw);
    let arrows = canonicalize_arrows(&decoded);
    arrows.trim().to_string()
}

/// Decodes HTML entities (`&gt;`, `&#8211;`, `&ndash;`, ...) until the text is stable.
///
/// Double-encoded text (`&amp;gt;`) shows up when the host escapes already-escaped content;
/// decoding to a fixed point keeps [`normalize_code`] idempotent on such input.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    // Fast path: nothing to decode.
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    // Terminates: a pass that changes the text either consumes an `&` or only decodes
    // `&`-producing entities, which are all longer than the `&` they produce.
    let mut current = input.to_string();
    while current.contains('&') {
        let next = htmlize::unescape(&current);
        if next == current {
            break;
        }
        current = next.into_owned();
    }
    Cow::Owned(current)
}

fn push_arrow(out: &mut String) {
    while out.ends_with(char::is_whitespace) {
        out.pop();
    }
    out.push_str(" --> ");
}

fn canonicalize_arrows(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut i = 0usize;

    while i < chars.len() {
        let ch = chars[i];
        let prev = i.checked_sub(1).map(|p| chars[p]);

        let arrow_len = match ch {
            '–' | '—' if chars.get(i + 1) == Some(&'>') => Some(2),
            '-' => {
                let mut run = 0usize;
                while chars.get(i + run) == Some(&'-') {
                    run += 1;
                }
                let head = chars.get(i + run).copied();
                let after_head = chars.get(i + run + 1).copied();
                let plain_head = head == Some('>') && after_head != Some('>');
                let attached = matches!(prev, Some('.' | '<' | '=' | '-'));
                if plain_head && (run == 1 || run == 2) && !attached {
                    Some(run + 1)
                } else {
                    // Copy the whole dash run so a longer arrow is never split.
                    out.extend(&chars[i..i + run]);
                    i += run;
                    continue;
                }
            }
            _ => None,
        };

        match arrow_len {
            Some(len) => {
                push_arrow(&mut out);
                i += len;
                while chars.get(i).copied().is_some_and(char::is_whitespace) {
                    i += 1;
                }
            }
            None => {
                out.push(ch);
                i += 1;
            }
        }
    }

    out
}
