//! Input and output ports (spec.md §3, §4.6).
//!
//! Builtins read and write through the current port stacks rather than
//! stdio directly, so `with-input-from-string`-style redirection and file
//! ports compose with `display`/`read-line` uniformly.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};

use crate::error::{Error, Result};

pub enum Port {
    Input(InputPort),
    Output(OutputPort),
}

pub enum InputPort {
    Stdin,
    File(BufReader<File>),
    String { chars: Vec<char>, pos: usize },
    Closed,
}

pub enum OutputPort {
    Stdout,
    Stderr,
    File(BufWriter<File>),
    String(String),
    Closed,
}

impl Port {
    pub fn open_input_file(path: &str) -> Result<Port> {
        let file = File::open(path)?;
        Ok(Port::Input(InputPort::File(BufReader::new(file))))
    }

    pub fn open_output_file(path: &str) -> Result<Port> {
        let file = File::create(path)?;
        Ok(Port::Output(OutputPort::File(BufWriter::new(file))))
    }

    pub fn input_string(contents: impl Into<String>) -> Port {
        Port::Input(InputPort::String {
            chars: contents.into().chars().collect(),
            pos: 0,
        })
    }

    pub fn output_string() -> Port {
        Port::Output(OutputPort::String(String::new()))
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Port::Input(_))
    }

    pub fn is_output(&self) -> bool {
        matches!(self, Port::Output(_))
    }

    pub fn close(&mut self) {
        match self {
            Port::Input(input) => *input = InputPort::Closed,
            Port::Output(output) => *output = OutputPort::Closed,
        }
    }

    /// Read a single line without the trailing newline. `None` at
    /// end-of-file.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        match self {
            Port::Input(InputPort::Stdin) => {
                let mut line = String::new();
                let n = io::stdin().lock().read_line(&mut line)?;
                if n == 0 {
                    Ok(None)
                } else {
                    Ok(Some(line.trim_end_matches('\n').trim_end_matches('\r').to_string()))
                }
            }
            Port::Input(InputPort::File(reader)) => {
                let mut line = String::new();
                let n = reader.read_line(&mut line)?;
                if n == 0 {
                    Ok(None)
                } else {
                    Ok(Some(line.trim_end_matches('\n').trim_end_matches('\r').to_string()))
                }
            }
            Port::Input(InputPort::String { chars, pos }) => {
                if *pos >= chars.len() {
                    return Ok(None);
                }
                let start = *pos;
                while *pos < chars.len() && chars[*pos] != '\n' {
                    *pos += 1;
                }
                let line: String = chars[start..*pos].iter().collect();
                if *pos < chars.len() {
                    *pos += 1;
                }
                Ok(Some(line))
            }
            Port::Input(InputPort::Closed) => Err(Error::Fatal("port is closed".to_string())),
            Port::Output(_) => Err(Error::Type("not an input port".to_string())),
        }
    }

    pub fn read_char(&mut self) -> Result<Option<char>> {
        match self {
            Port::Input(InputPort::Stdin) => {
                let mut buf = [0u8; 1];
                let n = io::stdin().lock().read(&mut buf)?;
                if n == 0 {
                    Ok(None)
                } else {
                    Ok(Some(buf[0] as char))
                }
            }
            Port::Input(InputPort::File(reader)) => {
                let mut buf = [0u8; 1];
                let n = reader.read(&mut buf)?;
                if n == 0 {
                    Ok(None)
                } else {
                    Ok(Some(buf[0] as char))
                }
            }
            Port::Input(InputPort::String { chars, pos }) => {
                if *pos >= chars.len() {
                    Ok(None)
                } else {
                    let ch = chars[*pos];
                    *pos += 1;
                    Ok(Some(ch))
                }
            }
            Port::Input(InputPort::Closed) => Err(Error::Fatal("port is closed".to_string())),
            Port::Output(_) => Err(Error::Type("not an input port".to_string())),
        }
    }

    pub fn write_str(&mut self, text: &str) -> Result<()> {
        match self {
            Port::Output(OutputPort::Stdout) => {
                print!("{text}");
                io::stdout().flush()?;
                Ok(())
            }
            Port::Output(OutputPort::Stderr) => {
                eprint!("{text}");
                Ok(())
            }
            Port::Output(OutputPort::File(writer)) => {
                writer.write_all(text.as_bytes())?;
                Ok(())
            }
            Port::Output(OutputPort::String(buffer)) => {
                buffer.push_str(text);
                Ok(())
            }
            Port::Output(OutputPort::Closed) => Err(Error::Fatal("port is closed".to_string())),
            Port::Input(_) => Err(Error::Type("not an output port".to_string())),
        }
    }

    /// Contents accumulated by an in-memory output string port.
    pub fn take_output_string(&self) -> Result<String> {
        match self {
            Port::Output(OutputPort::String(buffer)) => Ok(buffer.clone()),
            _ => Err(Error::Type("not a string output port".to_string())),
        }
    }
}

impl std::fmt::Debug for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Port::Input(_) => write!(f, "#<input-port>"),
            Port::Output(_) => write!(f, "#<output-port>"),
        }
    }
}
