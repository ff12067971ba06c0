// Console host for MarkView
// Reads commands from stdin, feeds the event queue and prints session state to stdout

use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::app::{App, AppEvent};
use crate::commands::{document, file, folder, settings};
use crate::error::Result;
use crate::models::{FileNode, SettingsUpdate, Theme};
use crate::storage::{absolute_path, StorageState};

const HELP: &str = "\
commands:
  open PATH          open a markdown file (focuses it when already open)
  new                new untitled document
  tabs               list open documents
  tab N              switch to tab N
  close [N]          close tab N (default: active tab)
  edit TEXT          replace the active text (\\n for newlines)
  append TEXT        append a line to the active text
  save               save the active document
  saveas PATH        save the active document under PATH
  find QUERY         start a search in the active document
  next | prev        move between matches
  clear              close the search
  search QUERY       list matches with surrounding context
  outline            table of contents
  stats              word, character, line and paragraph counts
  recent             recently opened files
  clear-recent       forget recent files
  tree DIR           markdown files below DIR
  image PATH         copy an image into assets/ and link it
  paste DATA_URL     save a base64 data URL into assets/ and link it
  settings           show settings
  set KEY VALUE      change a setting (autoSave, autoSaveDelay, autoReload,
                     openInNewTab, theme, fontSize, wordWrap)
  reset              restore default settings
  help               this text
  quit               exit";

/// One line of console input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Open(PathBuf),
    New,
    Tabs,
    Tab(usize), // 1-based
    Close(Option<usize>),
    Edit(String),
    Append(String),
    Save,
    SaveAs(PathBuf),
    Find(String),
    Next,
    Prev,
    Clear,
    Search(String),
    Outline,
    Stats,
    Recent,
    ClearRecent,
    Tree(PathBuf),
    Image(PathBuf),
    Paste(String),
    Settings,
    Set(SettingsUpdate),
    Reset,
    Help,
    Quit,
}

// ============================================
// PARSING
// ============================================

/// Parse one input line. Blank lines yield `Ok(None)`; errors are usage messages.
pub fn parse_command(line: &str) -> std::result::Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let command = match name.to_lowercase().as_str() {
        "open" | "o" => Command::Open(required_path(rest, "open PATH")?),
        "new" => Command::New,
        "tabs" | "ls" => Command::Tabs,
        "tab" => Command::Tab(tab_number(rest)?),
        "close" => {
            if rest.is_empty() {
                Command::Close(None)
            } else {
                Command::Close(Some(tab_number(rest)?))
            }
        }
        "edit" => Command::Edit(unescape(rest)),
        "append" => Command::Append(unescape(rest)),
        "save" | "w" => Command::Save,
        "saveas" => Command::SaveAs(required_path(rest, "saveas PATH")?),
        "find" | "/" => Command::Find(rest.to_string()),
        "next" | "n" => Command::Next,
        "prev" | "p" => Command::Prev,
        "clear" => Command::Clear,
        "search" => Command::Search(rest.to_string()),
        "outline" | "toc" => Command::Outline,
        "stats" => Command::Stats,
        "recent" => Command::Recent,
        "clear-recent" => Command::ClearRecent,
        "tree" => Command::Tree(if rest.is_empty() { PathBuf::from(".") } else { PathBuf::from(rest) }),
        "image" => Command::Image(required_path(rest, "image PATH")?),
        "paste" => {
            if rest.is_empty() {
                return Err("usage: paste DATA_URL".to_string());
            }
            Command::Paste(rest.to_string())
        }
        "settings" => Command::Settings,
        "set" => Command::Set(settings_update(rest)?),
        "reset" => Command::Reset,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(command))
}

fn required_path(rest: &str, usage: &str) -> std::result::Result<PathBuf, String> {
    if rest.is_empty() {
        return Err(format!("usage: {usage}"));
    }
    Ok(PathBuf::from(rest))
}

fn tab_number(rest: &str) -> std::result::Result<usize, String> {
    match rest.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("invalid tab number '{rest}'")),
    }
}

fn unescape(text: &str) -> String {
    text.replace("\\n", "\n").replace("\\t", "\t")
}

fn parse_bool(value: &str) -> std::result::Result<bool, String> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(format!("expected on/off, got '{value}'")),
    }
}

fn settings_update(rest: &str) -> std::result::Result<SettingsUpdate, String> {
    let Some((key, value)) = rest.split_once(char::is_whitespace) else {
        return Err("usage: set KEY VALUE".to_string());
    };
    let value = value.trim();
    let number = |v: &str| v.parse::<u64>().map_err(|_| format!("expected a number, got '{v}'"));

    let mut update = SettingsUpdate::default();
    match key {
        "autoSave" => update.auto_save = Some(parse_bool(value)?),
        "autoSaveDelay" => update.auto_save_delay = Some(number(value)?),
        "autoReload" => update.auto_reload = Some(parse_bool(value)?),
        "openInNewTab" => update.open_in_new_tab = Some(parse_bool(value)?),
        "wordWrap" => update.word_wrap = Some(parse_bool(value)?),
        "fontSize" => {
            let size = u32::try_from(number(value)?).map_err(|_| format!("font size out of range: {value}"))?;
            update.font_size = Some(size);
        }
        "theme" => {
            update.theme = Some(match value {
                "light" => Theme::Light,
                "dark" => Theme::Dark,
                "system" => Theme::System,
                _ => return Err(format!("unknown theme '{value}'")),
            })
        }
        _ => return Err(format!("unknown setting '{key}'")),
    }
    Ok(update)
}

// ============================================
// EVENT LOOP
// ============================================

/// Run the console until `quit` or end of input
pub async fn run_console(storage: StorageState, initial: Option<PathBuf>) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut app = App::new(storage.clone(), tx.clone());
    let mut settings_rx = storage.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    if let Some(path) = initial {
        let _ = tx.send(AppEvent::OpenPath(path));
    }
    println!("MarkView - type 'help' for commands");

    loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                if !handle_and_report(&mut app, event) {
                    break;
                }
            }
            Ok(()) = settings_rx.changed() => {
                let settings = settings_rx.borrow_and_update().clone();
                app.apply_settings(&settings);
            }
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) => match parse_command(&line) {
                        Ok(Some(command)) => {
                            // Apply queued events first so queries see earlier commands
                            while let Ok(event) = rx.try_recv() {
                                if !handle_and_report(&mut app, event) {
                                    return Ok(());
                                }
                            }
                            dispatch(&app, &tx, command);
                        }
                        Ok(None) => {}
                        Err(usage) => println!("{usage}"),
                    },
                    None => {
                        stdin_open = false;
                        let _ = tx.send(AppEvent::Shutdown);
                    }
                }
            }
        }
    }
    Ok(())
}

/// Handle one queued event and print its outcome. False once the app stopped.
fn handle_and_report(app: &mut App, event: AppEvent) -> bool {
    let report = Report::for_event(&event);
    if !app.handle(event) {
        return false;
    }
    report.print(app);
    true
}

/// Translate a command into queue messages, or answer queries directly.
///
/// Mutations are sent as intents so `App` resolves the target tab and text
/// when it handles them.
fn dispatch(app: &App, events: &UnboundedSender<AppEvent>, command: Command) {
    let send = |event: AppEvent| {
        let _ = events.send(event);
    };
    let active_text = || app.session().active_document().map(|d| d.text.clone()).unwrap_or_default();

    match command {
        Command::Open(path) => send(AppEvent::OpenPath(absolute_path(&path))),
        Command::New => send(AppEvent::NewDocument),
        Command::Tabs => print_tabs(app),
        Command::Tab(n) => send(AppEvent::SelectIndex(n - 1)),
        Command::Close(None) => send(AppEvent::CloseActive),
        Command::Close(Some(n)) => send(AppEvent::CloseIndex(n - 1)),
        Command::Edit(text) => send(AppEvent::EditActive(text)),
        Command::Append(line) => send(AppEvent::AppendActive(line)),
        Command::Save => send(AppEvent::SaveActive),
        Command::SaveAs(path) => send(AppEvent::SaveAsActive(path)),
        Command::Find(query) => send(AppEvent::Find(query)),
        Command::Next => send(AppEvent::FindNext),
        Command::Prev => send(AppEvent::FindPrev),
        Command::Clear => send(AppEvent::FindClear),
        Command::Search(query) => {
            let results = document::search_in_document(&active_text(), &query);
            if results.is_empty() {
                println!("no matches");
            }
            for r in results {
                println!("{:>5}:{:<4} {}", r.line, r.column, r.text);
            }
        }
        Command::Outline => {
            for heading in document::get_table_of_contents(&active_text()) {
                let indent = "  ".repeat(usize::from(heading.level.saturating_sub(1)));
                println!("{indent}{} (line {})", heading.text, heading.line);
            }
        }
        Command::Stats => {
            let stats = document::get_word_count(&active_text());
            println!(
                "{} words, {} characters, {} lines, {} paragraphs",
                stats.words, stats.characters, stats.lines, stats.paragraphs
            );
        }
        Command::Recent => {
            for (i, recent) in file::get_recent_files(app.storage()).iter().enumerate() {
                println!("{:>3}. {} ({})", i + 1, recent.name, recent.path.display());
            }
        }
        Command::ClearRecent => report_error(file::clear_recent_files(app.storage())),
        Command::Tree(dir) => match folder::open_folder(&dir) {
            Ok(nodes) => print_tree(&nodes, 0),
            Err(e) => println!("error: {e}"),
        },
        Command::Image(source) => send(AppEvent::InsertImage(absolute_path(&source))),
        Command::Paste(data_url) => send(AppEvent::PasteImage(data_url)),
        Command::Settings => match serde_json::to_string_pretty(&settings::get_settings(app.storage())) {
            Ok(json) => println!("{json}"),
            Err(e) => println!("error: {e}"),
        },
        Command::Set(update) => send(AppEvent::UpdateSettings(update)),
        Command::Reset => report_error(settings::reset_settings(app.storage()).map(|_| ())),
        Command::Help => println!("{HELP}"),
        Command::Quit => send(AppEvent::Shutdown),
    }
}

fn report_error(result: Result<()>) {
    if let Err(e) = result {
        println!("error: {e}");
    }
}

// ============================================
// OUTPUT
// ============================================

/// What to print once an event has been handled
enum Report {
    Tabs,
    Search,
    Nothing,
}

impl Report {
    fn for_event(event: &AppEvent) -> Self {
        match event {
            AppEvent::OpenPath(_)
            | AppEvent::FileDropped(_)
            | AppEvent::SecondInstance(_)
            | AppEvent::NewDocument
            | AppEvent::SetActive(_)
            | AppEvent::SelectIndex(_)
            | AppEvent::Close(_)
            | AppEvent::CloseActive
            | AppEvent::CloseIndex(_)
            | AppEvent::Save(_)
            | AppEvent::SaveActive
            | AppEvent::SaveAs { .. }
            | AppEvent::SaveAsActive(_)
            | AppEvent::FileChanged(_)
            | AppEvent::AutoSaveDue { .. } => Report::Tabs,
            AppEvent::Find(_)
            | AppEvent::FindNext
            | AppEvent::FindPrev
            | AppEvent::Edit { .. }
            | AppEvent::EditActive(_)
            | AppEvent::AppendActive(_)
            | AppEvent::InsertImage(_)
            | AppEvent::PasteImage(_) => Report::Search,
            _ => Report::Nothing,
        }
    }

    fn print(&self, app: &App) {
        match self {
            Report::Tabs => print_tabs(app),
            Report::Search if app.search().is_active() => print_search(app),
            _ => {}
        }
    }
}

fn print_tabs(app: &App) {
    let session = app.session();
    if session.is_empty() {
        println!("(no open documents)");
        return;
    }
    for (i, doc) in session.documents().iter().enumerate() {
        let marker = if session.active_id() == Some(doc.id) { '*' } else { ' ' };
        let dirty = if doc.dirty { " [modified]" } else { "" };
        println!("{marker}{:>2}. {}{dirty}", i + 1, doc.display_name);
    }
}

fn print_search(app: &App) {
    let search = app.search();
    match (search.current_index(), search.current_match()) {
        (Some(index), Some(m)) => println!(
            "match {}/{} on line {}: '{}'",
            index + 1,
            search.matches().len(),
            m.line_number,
            m.matched_text
        ),
        _ => println!("no matches for '{}'", search.query()),
    }
}

fn print_tree(nodes: &[FileNode], depth: usize) {
    for node in nodes {
        let suffix = if node.is_directory { "/" } else { "" };
        println!("{}{}{suffix}", "  ".repeat(depth), node.name);
        print_tree(&node.children, depth + 1);
    }
}
