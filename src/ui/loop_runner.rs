//! Read-eval-print loop driving the app from stdin.

use anyhow::Result;
use std::io::{BufRead, Write};

use crate::app::{App, Confirm, DeleteOutcome};
use crate::model::BlogDraft;
use crate::selection::EditorTarget;
use crate::storage::BlogError;
use crate::util::validate_article_url;

use super::commands::{parse, Command};
use super::render;

const PROMPT: &str = "newsdesk> ";

/// Whether the loop keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// Asks on the terminal. Anything but `y`/`yes` declines.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        if std::io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        }
    }
}

/// Run the shell until `quit` or end of input.
pub async fn run(app: &mut App, confirm: &dyn Confirm) -> Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(stdout, "newsdesk: type 'help' for commands")?;

    let start = app.feed.settings().default_category.clone();
    let outcome = app.select_category(&start).await;
    writeln!(stdout, "{}", render::category_outcome(outcome, app))?;
    write!(stdout, "{}", render::article_list(app.visible_articles(), &app.bookmarks))?;

    loop {
        write!(stdout, "{PROMPT}")?;
        stdout.flush()?;

        let line = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|n| (n, line))
        })
        .await??;
        let (read, line) = line;
        if read == 0 {
            writeln!(stdout)?;
            break;
        }

        if execute_line(app, &line, confirm, &mut stdout).await? == Action::Quit {
            break;
        }
    }

    tracing::info!("Shell exited");
    Ok(())
}

/// Parse and run one line, writing results to `out`.
pub async fn execute_line(
    app: &mut App,
    line: &str,
    confirm: &dyn Confirm,
    out: &mut impl Write,
) -> Result<Action> {
    let command = match parse(line) {
        Ok(Some(command)) => command,
        Ok(None) => return Ok(Action::Continue),
        Err(e) => {
            writeln!(out, "{e}")?;
            return Ok(Action::Continue);
        }
    };
    tracing::debug!(?command, "Executing shell command");

    let action = execute(app, command, confirm, out).await?;
    for warning in app.take_warnings() {
        writeln!(out, "warning: {warning}")?;
    }
    Ok(action)
}

async fn execute(
    app: &mut App,
    command: Command,
    confirm: &dyn Confirm,
    out: &mut impl Write,
) -> Result<Action> {
    match command {
        Command::Category(name) => {
            let outcome = app.select_category(&name).await;
            writeln!(out, "{}", render::category_outcome(outcome, app))?;
            write!(out, "{}", render::article_list(app.visible_articles(), &app.bookmarks))?;
        }
        Command::Categories => writeln!(out, "{}", render::categories())?,
        Command::Search(query) => match app.search(&query).await {
            Some(outcome) => {
                writeln!(out, "{}", render::fetch_outcome(outcome, app))?;
                write!(out, "{}", render::article_list(app.visible_articles(), &app.bookmarks))?;
            }
            None => writeln!(out, "empty search ignored")?,
        },
        Command::Clear => {
            let outcome = app.clear_search().await;
            writeln!(out, "{}", render::fetch_outcome(outcome, app))?;
            write!(out, "{}", render::article_list(app.visible_articles(), &app.bookmarks))?;
        }
        Command::Retry => {
            let outcome = app.retry().await;
            writeln!(out, "{}", render::fetch_outcome(outcome, app))?;
            write!(out, "{}", render::article_list(app.visible_articles(), &app.bookmarks))?;
        }
        Command::Show(index) => match app.open_article(index) {
            Some(article) => {
                let article = article.clone();
                let bookmarked = app.bookmarks.is_bookmarked(&article);
                write!(out, "{}", render::article_detail(&article, bookmarked))?;
            }
            None => writeln!(out, "no article {}", index + 1)?,
        },
        Command::Open(index) => match app.visible_articles().get(index) {
            Some(article) => match validate_article_url(&article.url) {
                Ok(url) => {
                    if let Err(e) = open::that(url.as_str()) {
                        tracing::warn!(error = %e, "Failed to open browser");
                        writeln!(out, "could not open browser: {e}")?;
                    }
                }
                Err(e) => writeln!(out, "refusing to open link: {e}")?,
            },
            None => writeln!(out, "no article {}", index + 1)?,
        },
        Command::Bookmark(index) => match app.toggle_bookmark(index).await {
            Some(true) => writeln!(out, "bookmarked")?,
            Some(false) => writeln!(out, "bookmark removed")?,
            None => writeln!(out, "no article {}", index + 1)?,
        },
        Command::Bookmarks => {
            let outcome = app.select_category(crate::feed::BOOKMARK_CATEGORY).await;
            writeln!(out, "{}", render::category_outcome(outcome, app))?;
            write!(out, "{}", render::article_list(app.bookmarks.items(), &app.bookmarks))?;
        }
        Command::Unbookmark(index) => match app.remove_bookmark(index).await {
            Some(article) => writeln!(out, "removed \"{}\"", article.title)?,
            None => writeln!(out, "no bookmark {}", index + 1)?,
        },
        Command::Blogs => write!(out, "{}", render::blog_list(app.blogs.items()))?,
        Command::BlogNew {
            title,
            content,
            image,
        } => {
            save_blog(app, EditorTarget::Create, title, content, image, out).await?;
        }
        Command::BlogEdit {
            id,
            title,
            content,
            image,
        } => {
            save_blog(app, EditorTarget::Edit(id), title, content, image, out).await?;
        }
        Command::BlogShow(id) => match app.open_blog(id) {
            Some(post) => write!(out, "{}", render::blog_detail(post))?,
            None => writeln!(out, "no blog post {id}")?,
        },
        Command::BlogRemove(id) => match app.delete_blog(id, confirm).await {
            DeleteOutcome::Deleted => writeln!(out, "deleted")?,
            DeleteOutcome::Declined => writeln!(out, "kept")?,
            DeleteOutcome::NotFound => writeln!(out, "no blog post {id}")?,
        },
        Command::Close => {
            if !app.selection.close_top() {
                writeln!(out, "nothing open")?;
            }
        }
        Command::Status => write!(out, "{}", render::status(app))?,
        Command::Help => writeln!(out, "{}", render::HELP)?,
        Command::Quit => return Ok(Action::Quit),
    }
    Ok(Action::Continue)
}

async fn save_blog(
    app: &mut App,
    target: EditorTarget,
    title: String,
    content: String,
    image: Option<std::path::PathBuf>,
    out: &mut impl Write,
) -> Result<()> {
    let mut draft = BlogDraft::new(title, content);
    if let Some(path) = image {
        match app.encode_image(&path).await {
            Ok(encoded) => draft = draft.with_image(encoded),
            Err(e) => {
                writeln!(out, "image not used: {e}")?;
            }
        }
    }

    match app.save_blog(target, draft).await {
        Ok(post) => writeln!(out, "saved blog post #{}", post.id)?,
        Err(BlogError::Validation(e)) => {
            // Nothing to keep the form open for in a line shell.
            app.selection.close_editor();
            writeln!(out, "not saved: {e}")?;
        }
        Err(e @ BlogError::NotFound(_)) => {
            app.selection.close_editor();
            writeln!(out, "not saved: {e}")?;
        }
    }
    Ok(())
}
