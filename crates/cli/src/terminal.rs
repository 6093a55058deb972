use anyhow::Result;
use crossterm::{
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{self, Write};

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const USER_PROMPT: Color = Color::Green;
    const ASSISTANT_TEXT: Color = Color::Cyan;
    const ERROR: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
    const HEADER: Color = Color::Magenta;
}

/// Output side of the REPL.
///
/// Colors are only emitted when writing to a real terminal; tests use
/// [`Terminal::plain`] to get bare text.
pub struct Terminal<W: Write> {
    out: W,
    colored: bool,
}

impl Terminal<io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: io::stdout(),
            colored: true,
        }
    }
}

#[cfg(test)]
impl<W: Write> Terminal<W> {
    pub fn plain(out: W) -> Self {
        Self {
            out,
            colored: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Terminal<W> {
    fn colored(&mut self, color: Color, text: &str) -> Result<()> {
        if self.colored {
            queue!(self.out, SetForegroundColor(color), Print(text), ResetColor)?;
        } else {
            queue!(self.out, Print(text))?;
        }
        Ok(())
    }

    /// Print the startup banner.
    pub fn print_banner(&mut self, provider: &str, model: &str, tools: usize) -> Result<()> {
        self.colored(Colors::HEADER, "itembox-agent")?;
        queue!(self.out, Print(" - Interactive AI Agent\n"))?;
        self.colored(
            Colors::DIM,
            &format!(
                "Provider: {} | Model: {} | Tools: {}\nType 'exit' or 'quit' to end.\n---\n",
                provider, model, tools
            ),
        )?;
        self.out.flush()?;
        Ok(())
    }

    pub fn print_prompt(&mut self) -> Result<()> {
        self.colored(Colors::USER_PROMPT, "You: ")?;
        self.out.flush()?;
        Ok(())
    }

    pub fn print_response(&mut self, text: &str) -> Result<()> {
        self.colored(Colors::ASSISTANT_TEXT, &format!("AI: {}", text))?;
        queue!(self.out, Print("\n\n"))?;
        self.out.flush()?;
        Ok(())
    }

    pub fn print_error(&mut self, msg: &str) -> Result<()> {
        self.colored(Colors::ERROR, &format!("Error: {}\n", msg))?;
        self.out.flush()?;
        Ok(())
    }

    pub fn print_info(&mut self, msg: &str) -> Result<()> {
        self.colored(Colors::DIM, &format!("{}\n", msg))?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(f: impl FnOnce(&mut Terminal<Vec<u8>>) -> Result<()>) -> String {
        let mut term = Terminal::plain(Vec::new());
        f(&mut term).unwrap();
        String::from_utf8(term.into_inner()).unwrap()
    }

    #[test]
    fn test_plain_response() {
        assert_eq!(output(|t| t.print_response("hi")), "AI: hi\n\n");
    }

    #[test]
    fn test_plain_prompt_and_error() {
        assert_eq!(output(|t| t.print_prompt()), "You: ");
        assert_eq!(output(|t| t.print_error("boom")), "Error: boom\n");
    }

    #[test]
    fn test_banner_names_provider_and_model() {
        let text = output(|t| t.print_banner("groq", "llama-3.3-70b-versatile", 3));
        assert!(text.contains("Provider: groq"));
        assert!(text.contains("Model: llama-3.3-70b-versatile"));
        assert!(text.contains("Tools: 3"));
    }
}
