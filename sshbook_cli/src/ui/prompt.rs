use std::io::{self, Write};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

/// Print `label` and read one line from stdin, without the trailing newline.
pub fn read_line(label: &str) -> io::Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Masked prompt: raw mode via crossterm, nothing is echoed.
pub fn read_password(label: &str) -> io::Result<String> {
    print!("{label}");
    io::stdout().flush()?;

    enable_raw_mode()?;
    let result = read_password_raw();
    // Restore the terminal whatever happened in between.
    let _ = disable_raw_mode();
    println!();

    result
}

fn read_password_raw() -> io::Result<String> {
    let mut password = String::new();
    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Enter => break,
                KeyCode::Backspace => {
                    password.pop();
                }
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Err(io::Error::new(io::ErrorKind::Interrupted, "cancelled"));
                }
                KeyCode::Char(c) => password.push(c),
                _ => {}
            }
        }
    }
    Ok(password)
}
