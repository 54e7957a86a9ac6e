//! Line commands typed at the wizard prompt.

use crate::context::Characteristic;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Inspire(String),
    Add(String),
    Remove(String),
    /// 1-based position in the quick-add list.
    Quick(usize),
    Dietary(bool),
    Toggle(Characteristic),
    Pick(String),
    /// 1-based recipe option.
    Choose(usize),
    Next,
    Back,
    Reset,
    Refine(String),
    Export,
    Show,
    Help,
    Quit,
}

fn required<'a>(verb: &str, rest: &'a str) -> Result<&'a str, String> {
    if rest.is_empty() {
        Err(format!("`{verb}` needs an argument"))
    } else {
        Ok(rest)
    }
}

fn position(verb: &str, rest: &str) -> Result<usize, String> {
    match rest.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(format!("`{verb}` takes a number starting at 1")),
    }
}

pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((v, r)) => (v, r.trim()),
        None => (line, ""),
    };

    let cmd = match verb.to_ascii_lowercase().as_str() {
        "inspire" => Command::Inspire(rest.to_string()),
        "add" => Command::Add(required(verb, rest)?.to_string()),
        "rm" | "remove" => Command::Remove(required(verb, rest)?.to_string()),
        "quick" => Command::Quick(position(verb, rest)?),
        "dietary" => match rest.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" => Command::Dietary(true),
            "off" | "no" | "false" => Command::Dietary(false),
            _ => return Err("`dietary` takes on or off".into()),
        },
        "toggle" => Command::Toggle(required(verb, rest)?.parse()?),
        "pick" => Command::Pick(required(verb, rest)?.to_string()),
        "choose" => Command::Choose(position(verb, rest)?),
        "next" | "n" => Command::Next,
        "back" | "b" => Command::Back,
        "reset" => Command::Reset,
        "refine" => Command::Refine(rest.to_string()),
        "export" => Command::Export,
        "show" | "" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command `{other}` (try `help`)")),
    };
    Ok(cmd)
}
