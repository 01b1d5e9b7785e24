/// Interprets a raw stored balance.
///
/// Unset keys and values without a leading integer read as `0`, so an account
/// that was never reset starts from an empty balance instead of failing. A
/// value such as `"42abc"` reads as `42`, matching the legacy reader.
#[must_use]
pub fn parse_stored_balance(raw: Option<&str>) -> i64 {
    raw.and_then(leading_integer).unwrap_or(0)
}

/// Same as [`parse_stored_balance`] for a raw store reply; invalid UTF-8 is
/// replaced before parsing.
#[must_use]
pub fn parse_stored_reply(raw: Option<&[u8]>) -> i64 {
    raw.map(String::from_utf8_lossy)
        .map_or(0, |text| parse_stored_balance(Some(text.as_ref())))
}

fn leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let magnitude: i64 = digits.get(..end)?.parse().ok()?;

    Some(if negative { -magnitude } else { magnitude })
}
