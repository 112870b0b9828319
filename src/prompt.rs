use std::io::{BufRead, Write};

/// Asks a y/N question. Anything but "y"/"yes" (including EOF) is a no.
pub fn confirm<R: BufRead, W: Write>(question: &str, input: &mut R, output: &mut W) -> std::io::Result<bool> {
    write!(output, "{question} [y/N]? ")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
