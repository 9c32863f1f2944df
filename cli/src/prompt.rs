//! Interactive confirmation before destructive intents.

use std::io::{self, BufRead, Write};

/// Asks `question` and reads a yes/no answer. Anything but `y`/`yes`
/// (case-insensitive), including end of input, counts as no.
pub fn confirm<R: BufRead, W: Write>(
    question: &str,
    input: &mut R,
    output: &mut W,
) -> io::Result<bool> {
    write!(output, "{} [y/N] ", question)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
