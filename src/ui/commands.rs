//! Shell command parsing.
//!
//! Item numbers are typed 1-based and stored 0-based.

use std::path::PathBuf;
use thiserror::Error;

use crate::util::MAX_SEARCH_QUERY_LENGTH;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Category(String),
    Categories,
    Search(String),
    Clear,
    Retry,
    Show(usize),
    Open(usize),
    Bookmark(usize),
    Bookmarks,
    Unbookmark(usize),
    Blogs,
    BlogNew {
        title: String,
        content: String,
        image: Option<PathBuf>,
    },
    BlogEdit {
        id: i64,
        title: String,
        content: String,
        image: Option<PathBuf>,
    },
    BlogShow(i64),
    BlogRemove(i64),
    Close,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command '{0}' (type 'help')")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Parse one input line. Blank lines give `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = split_word(line);

    let cmd = match word {
        "cat" | "category" => {
            if rest.is_empty() {
                return Err(ParseError::Usage("cat <name>"));
            }
            Command::Category(rest.to_string())
        }
        "cats" | "categories" => Command::Categories,
        "search" | "/" => {
            if rest.is_empty() {
                return Err(ParseError::Usage("search <query>"));
            }
            Command::Search(rest.chars().take(MAX_SEARCH_QUERY_LENGTH).collect())
        }
        "clear" => Command::Clear,
        "retry" | "r" => Command::Retry,
        "show" => Command::Show(index(rest, "show <n>")?),
        "open" => Command::Open(index(rest, "open <n>")?),
        "bm" => Command::Bookmark(index(rest, "bm <n>")?),
        "unbm" => Command::Unbookmark(index(rest, "unbm <n>")?),
        "bookmarks" => Command::Bookmarks,
        "blogs" => Command::Blogs,
        "blog" => parse_blog(rest)?,
        "close" | "back" => Command::Close,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(cmd))
}

fn parse_blog(rest: &str) -> Result<Command, ParseError> {
    const NEW: &str = "blog new <title> | <content> [| <image path>]";
    const EDIT: &str = "blog edit <id> <title> | <content> [| <image path>]";

    let (sub, args) = split_word(rest);
    match sub {
        "new" => {
            let (title, content, image) = form_fields(args).ok_or(ParseError::Usage(NEW))?;
            Ok(Command::BlogNew {
                title,
                content,
                image,
            })
        }
        "edit" => {
            let (id, args) = split_word(args);
            let id = id.parse().map_err(|_| ParseError::Usage(EDIT))?;
            let (title, content, image) = form_fields(args).ok_or(ParseError::Usage(EDIT))?;
            Ok(Command::BlogEdit {
                id,
                title,
                content,
                image,
            })
        }
        "show" => Ok(Command::BlogShow(
            args.parse().map_err(|_| ParseError::Usage("blog show <id>"))?,
        )),
        "rm" | "delete" => Ok(Command::BlogRemove(
            args.parse().map_err(|_| ParseError::Usage("blog rm <id>"))?,
        )),
        _ => Err(ParseError::Usage("blog new|edit|show|rm ...")),
    }
}

/// `title | content [| image]`. Fields may be empty; the store validates them.
fn form_fields(args: &str) -> Option<(String, String, Option<PathBuf>)> {
    let mut parts = args.splitn(3, '|').map(str::trim);
    let title = parts.next()?.to_string();
    let content = parts.next()?.to_string();
    let image = parts.next().filter(|p| !p.is_empty()).map(PathBuf::from);
    Some((title, content, image))
}

fn split_word(s: &str) -> (&str, &str) {
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (s, ""),
    }
}

fn index(arg: &str, usage: &'static str) -> Result<usize, ParseError> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(ParseError::Usage(usage)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blank_line() {
        assert_eq!(parse("   "), Ok(None));
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("cat Sports"), Ok(Some(Command::Category("Sports".into()))));
        assert_eq!(parse("search  lava flows "), Ok(Some(Command::Search("lava flows".into()))));
        assert_eq!(parse("show 1"), Ok(Some(Command::Show(0))));
        assert_eq!(parse("bm 3"), Ok(Some(Command::Bookmark(2))));
        assert_eq!(parse("quit"), Ok(Some(Command::Quit)));
    }

    #[test]
    fn test_index_must_be_positive() {
        assert_eq!(parse("show 0"), Err(ParseError::Usage("show <n>")));
        assert_eq!(parse("open x"), Err(ParseError::Usage("open <n>")));
    }

    #[test]
    fn test_search_requires_query() {
        assert!(matches!(parse("search"), Err(ParseError::Usage(_))));
    }

    #[test]
    fn test_long_query_truncated() {
        let long = "a".repeat(MAX_SEARCH_QUERY_LENGTH + 10);
        let Ok(Some(Command::Search(q))) = parse(&format!("search {long}")) else {
            panic!("expected search");
        };
        assert_eq!(q.len(), MAX_SEARCH_QUERY_LENGTH);
    }

    #[test]
    fn test_blog_new() {
        assert_eq!(
            parse("blog new My day | It was fine | ~/pic.png"),
            Ok(Some(Command::BlogNew {
                title: "My day".into(),
                content: "It was fine".into(),
                image: Some(PathBuf::from("~/pic.png")),
            }))
        );
        assert_eq!(
            parse("blog new Title only"),
            Err(ParseError::Usage("blog new <title> | <content> [| <image path>]"))
        );
    }

    #[test]
    fn test_blog_edit_with_image() {
        assert_eq!(
            parse("blog edit 42 T | a | b"),
            Ok(Some(Command::BlogEdit {
                id: 42,
                title: "T".into(),
                content: "a".into(),
                image: Some(PathBuf::from("b")),
            }))
        );
    }

    #[test]
    fn test_blog_rm_and_show() {
        assert_eq!(parse("blog rm 7"), Ok(Some(Command::BlogRemove(7))));
        assert_eq!(parse("blog show 7"), Ok(Some(Command::BlogShow(7))));
        assert!(parse("blog rm seven").is_err());
    }

    #[test]
    fn test_unknown() {
        assert_eq!(parse("frobnicate"), Err(ParseError::Unknown("frobnicate".into())));
    }
}
