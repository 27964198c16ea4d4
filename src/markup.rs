//! HTML repair for Telegram delivery.
//!
//! Telegram rejects messages whose HTML is malformed or uses tags outside its
//! inline subset, so every generated fragment passes through [`sanitize`]
//! before it is sent. The repair is intentionally conservative: it strips
//! disallowed tags, drops closing tags that do not match the innermost open
//! tag, and force-closes whatever is left open. Text content is never
//! re-ordered or escaped.

use regex::Regex;
use std::sync::OnceLock;

/// Tags Telegram accepts in `parse_mode=HTML` messages.
const ALLOWED_TAGS: [&str; 7] = ["b", "i", "u", "strong", "em", "code", "pre"];

fn tag_regex() -> &'static Regex {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    // Anything tag-shaped: optional slash, a name, optional attributes.
    TAG_RE.get_or_init(|| Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9]*)((?:\s[^>]*)?)>").expect("Invalid regex"))
}

/// Repair `text` so it contains only well-formed, allow-listed HTML.
///
/// Single left-to-right pass over tag-shaped tokens, tracking a stack of open
/// tags:
/// - tags with a disallowed name are removed entirely (surviving tags keep
///   their attributes verbatim; only the name is checked),
/// - an allowed opening tag is kept and pushed,
/// - an allowed closing tag is kept only when it closes the innermost open
///   tag; a mismatched or stray closer is dropped,
/// - closing tags for everything still open are appended innermost-first.
///
/// The result is idempotent: sanitizing already-balanced output is a no-op.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut open: Vec<&str> = Vec::new();
    let mut last = 0;

    for caps in tag_regex().captures_iter(text) {
        let whole = caps.get(0).expect("match");
        out.push_str(&text[last..whole.start()]);
        last = whole.end();

        let closing = !caps[1].is_empty();
        // Resolving the name against ALLOWED_TAGS yields a 'static borrow
        // for the stack.
        let name = match ALLOWED_TAGS.iter().copied().find(|t| *t == &caps[2]) {
            Some(name) => name,
            None => continue, // disallowed tag: stripped
        };

        if closing {
            if open.last() == Some(&name) {
                open.pop();
                out.push_str(whole.as_str());
            }
            // Mismatched closer: dropped, stack untouched.
        } else {
            open.push(name);
            out.push_str(whole.as_str());
        }
    }

    out.push_str(&text[last..]);

    for name in open.iter().rev() {
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }

    out
}
