use std::fmt;

use aliri_braid::braid;

/// An opaque handle naming a signed-in account within the identity library
#[braid(serde)]
pub struct AccountId;

/// A single permission scope
#[braid(serde)]
pub struct Scope;

/// An opaque bearer access token issued by the identity library
#[braid(serde, debug = "owned", display = "owned")]
pub struct AccessToken;

impl fmt::Debug for AccessTokenRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            f.write_str("\"")?;
            reveal_prefix(&self.0, f.width().unwrap_or(15), f)?;
            f.write_str("\"")
        } else {
            f.write_str("***ACCESS TOKEN***")
        }
    }
}

impl fmt::Display for AccessTokenRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            reveal_prefix(&self.0, f.width().unwrap_or(usize::MAX), f)
        } else {
            f.write_str("***ACCESS TOKEN***")
        }
    }
}

/// Writes at most `max_len` characters of `unprotected`, eliding the rest
fn reveal_prefix(unprotected: &str, max_len: usize, f: &mut fmt::Formatter) -> fmt::Result {
    if max_len <= 1 {
        return f.write_str("…");
    }

    match unprotected.char_indices().nth(max_len - 1) {
        Some((idx, _)) if idx < unprotected.len() => {
            f.write_str(&unprotected[..idx])?;
            f.write_str("…")
        }
        _ => f.write_str(unprotected),
    }
}
