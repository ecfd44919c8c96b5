//! Statement text cleanup.

/// Collapses every run of whitespace, newlines included, into one space and
/// trims both ends.
///
/// Catalog statements are written across many lines; sending them as a single
/// line keeps them readable when they show up in `pg_stat_activity` or in the
/// output of `ps`, `locks` and friends.
///
/// Quoted text is copied untouched: string literals (`'a  b'`, `E'\''`) and
/// quoted identifiers (`"my  table"`), so rows never change.
pub fn collapse_whitespace(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut pending_space = false;

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }

        if c == '\'' || c == '"' {
            // E'...' literals allow backslash escapes.
            let escapes = c == '\'' && out.ends_with(['E', 'e']);
            out.push(c);
            while let Some(q) = chars.next() {
                out.push(q);
                if escapes && q == '\\' {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                } else if q == c {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}
